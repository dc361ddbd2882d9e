//! Contextual handler behaviour, exercised through the pipeline.

use omni_migrate::{ContextualRewriter, MigrateConfig, RewritePipeline, RuleCatalog};

fn rewrite(input: &str) -> omni_migrate::RewriteOutcome {
    RewritePipeline::new(MigrateConfig::default())
        .expect("Failed to build pipeline")
        .rewrite(input)
}

fn with_header(body: &str) -> String {
    format!("import pandas as pd\n{body}")
}

#[test]
fn test_ix_positions_and_labels() {
    let outcome = rewrite(&with_header(
        "a = df.ix[3]\nb = df.ix['row']\nc = df.ix[1:4, 0]\nd = df.ix[:, 'B']\n",
    ));
    assert_eq!(
        outcome.text,
        with_header("a = df.iloc[3]\nb = df.loc['row']\nc = df.iloc[1:4, 0]\nd = df.loc[:, 'B']\n")
    );
    let iloc = &outcome.changes[0];
    assert_eq!(iloc.rule_name, "ix_to_iloc");
    assert_eq!((iloc.count, iloc.lines.clone()), (2, vec![2, 4]));
    let loc = &outcome.changes[1];
    assert_eq!(loc.rule_name, "ix_to_loc");
    assert_eq!((loc.count, loc.lines.clone()), (2, vec![3, 5]));
}

#[test]
fn test_nested_ix_is_rewritten_on_rescan() {
    let outcome = rewrite(&with_header("x = df.ix[other.ix[0]]\n"));
    assert_eq!(outcome.text, with_header("x = df.loc[other.iloc[0]]\n"));
}

#[test]
fn test_windowed_variants() {
    let outcome = rewrite(&with_header(
        "a = pd.rolling_std(df['A'], window=10, ddof=0)\nb = pd.expanding_max(s, min_periods=3)\nc = pd.ewmstd(s, com=0.5)\nd = pd.rolling_corr(a, b, 20)\n",
    ));
    assert_eq!(
        outcome.text,
        with_header(
            "a = df['A'].rolling(10).std(ddof=0)\nb = s.expanding(min_periods=3).max()\nc = s.ewm(com=0.5).std()\nd = a.rolling(20).corr(b)\n"
        )
    );
    let names: Vec<&str> = outcome.changes.iter().map(|c| c.rule_name.as_str()).collect();
    assert_eq!(names, vec!["rolling_std", "expanding_max", "ewm_std", "rolling_corr"]);
}

#[test]
fn test_windowed_freq_is_reported_and_left_alone() {
    let input = with_header("m = pd.rolling_mean(s, 5, freq='D')\nn = pd.rolling_sum(s, 3)\n");
    let outcome = rewrite(&input);

    assert!(outcome.text.contains("m = pd.rolling_mean(s, 5, freq='D')\n"));
    assert!(outcome.text.contains("n = s.rolling(3).sum()\n"));
    let errors: Vec<_> = outcome.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule_name, "windowed_aggregation");
    assert_eq!(errors[0].lines, vec![2]);
    assert_eq!(errors[0].count, 0);
    assert!(errors[0].error.as_deref().unwrap_or_default().contains("freq"));
    assert_eq!(outcome.total_changes(), 1);
}

#[test]
fn test_get_value_accessors() {
    let outcome = rewrite(&with_header(
        "a = df.get_value(0, 'A')\nb = s.get_value('x')\nc = df.get_value(0, 1, takeable=True)\n",
    ));
    assert_eq!(
        outcome.text,
        with_header("a = df.at[0, 'A']\nb = s.at['x']\nc = df.iat[0, 1]\n")
    );
}

#[test]
fn test_set_value_statements_become_assignments() {
    let outcome = rewrite(&with_header(
        "def fill(df, s):\n    df.set_value(1, 'A', 100)\n    s.set_value('x', 5)  # scalar\n    return df\n",
    ));
    assert_eq!(
        outcome.text,
        with_header(
            "def fill(df, s):\n    df.at[1, 'A'] = 100\n    s.at['x'] = 5  # scalar\n    return df\n"
        )
    );
    assert_eq!(outcome.changes[0].rule_name, "set_value_to_at");
    assert_eq!(outcome.changes[0].count, 2);
}

#[test]
fn test_set_value_in_expression_is_an_error() {
    let input = with_header("result = df.set_value(1, 'A', 100)\n");
    let outcome = rewrite(&input);

    assert_eq!(outcome.text, input);
    let errors: Vec<_> = outcome.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule_name, "set_value_to_at");
    assert!(
        errors[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("expression")
    );
}

#[test]
fn test_set_value_marker_fallback_on_unparseable_text() {
    let config = MigrateConfig::default();
    let catalog = RuleCatalog::builtin(&config).expect("catalog");
    let input = "df.set_value(1, 'A', 100)\nif broken\n".to_string();

    let output = ContextualRewriter::new(&catalog, &config).apply(input);

    assert_eq!(output.text, "df.at[1, 'A'] = 100\nif broken\n");
    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].rule_name, "set_value_to_at");
}

#[test]
fn test_guard_skips_already_guarded_and_chained_receivers() {
    let input = with_header(
        "a = df.stack()\nb = (df.stack() if not df.empty else pd.Series(dtype=object))\nc = make().x.stack()\n",
    );
    let outcome = rewrite(&input);

    assert_eq!(
        outcome.text,
        with_header(
            "a = (df.stack() if not df.empty else pd.Series(dtype=object))\nb = (df.stack() if not df.empty else pd.Series(dtype=object))\nc = make().x.stack()\n"
        )
    );
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].rule_name, "empty_stack_guard");
    assert_eq!(outcome.changes[0].lines, vec![2]);
}

#[test]
fn test_guard_adds_pandas_import_when_missing() {
    let outcome = rewrite("import pandas\n\nflat = frame.stack()\n");
    assert_eq!(
        outcome.text,
        "import pandas\nimport pandas as pd\n\nflat = (frame.stack() if not frame.empty else pd.Series(dtype=object))\n"
    );
}

#[test]
fn test_subtraction_respects_precedence() {
    let outcome = rewrite(&with_header(
        "a = df - df['mkt']\nb = 2 * df - df['mkt']\nc = df - df['mkt'] * 2\nd = df - df[['a', 'b']]\n",
    ));
    assert_eq!(
        outcome.text,
        with_header(
            "a = df.sub(df['mkt'], axis=0)\nb = 2 * df - df['mkt']\nc = df - df['mkt'] * 2\nd = df - df[['a', 'b']]\n"
        )
    );
}

#[test]
fn test_ols_routes() {
    let outcome = rewrite(&with_header(
        "a = pd.ols(y=returns, x=factors)\nb = pd.ols(y=r, x=f, intercept=False)\nc = pd.ols(y=r, x=f, pool=False)\n",
    ));
    assert_eq!(
        outcome.text,
        "import pandas as pd\nimport statsmodels.api as sm\nfrom aqr.stats.ols import OLS\na = sm.OLS(returns, sm.add_constant(factors)).fit()\nb = sm.OLS(r, f).fit()\nc = OLS(y=r, x=f, pool=False)\n"
    );
    let names: Vec<&str> = outcome.changes.iter().map(|c| c.rule_name.as_str()).collect();
    assert_eq!(names, vec!["ols_to_statsmodels", "ols_to_inhouse_ols", "add_imports"]);
    assert_eq!(outcome.changes[0].count, 2);
}

#[test]
fn test_ols_unknown_keyword_is_an_error() {
    let input = with_header("model = pd.ols(y=r, x=f, window=60)\n");
    let outcome = rewrite(&input);
    assert_eq!(outcome.text, input);
    assert_eq!(outcome.errors().count(), 1);
}

#[test]
fn test_datetimeindex_range_becomes_date_range() {
    let outcome = rewrite(&with_header(
        "a = pd.DatetimeIndex(start='2020-01-01', end='2020-12-31', freq='D')\nb = pd.DatetimeIndex('2020-01-01', '2020-02-01', freq='B')\nc = pd.DatetimeIndex(dates)\n",
    ));
    assert_eq!(
        outcome.text,
        with_header(
            "a = pd.date_range(start='2020-01-01', end='2020-12-31', freq='D')\nb = pd.date_range('2020-01-01', '2020-02-01', freq='B')\nc = pd.DatetimeIndex(dates)\n"
        )
    );
    assert_eq!(outcome.changes[0].rule_name, "datetimeindex_to_date_range");
    assert_eq!(outcome.changes[0].count, 2);
}

#[test]
fn test_panel_rules_require_in_house_import() {
    let outcome = rewrite("import pandas as pd\n\np = pd.Panel(data)\n");
    assert_eq!(
        outcome.text,
        "import pandas as pd\nfrom aqr.core.panel import Panel\n\np = Panel(data)\n"
    );

    let outcome = rewrite("from pandas import Panel\nimport pandas as pd\np = pd.Panel(data)\n");
    assert_eq!(
        outcome.text,
        "from aqr.core.panel import Panel\nimport pandas as pd\np = Panel(data)\n"
    );
    assert!(outcome.changes.iter().all(|c| c.rule_name != "add_imports"));
}
