//! Tests for batch migration, the path filter and diff previews.

use std::path::Path;

use omni_migrate::{
    LineTag, MigrateConfig, RewritePipeline, SkipReason, SourceFile, changed_lines,
    is_safe_to_modify,
};

#[test]
fn test_batch_processes_files_in_parallel() {
    let pipeline = RewritePipeline::new(MigrateConfig::default()).expect("Failed to build pipeline");
    let mut files: Vec<SourceFile> = (0..32)
        .map(|i| {
            SourceFile::new(
                format!("signals/module_{i}.py"),
                "import pandas as pd\nclean = s.valid()\nm = pd.rolling_mean(s, 5)\n",
            )
        })
        .collect();
    files.push(SourceFile::new(
        "signals/broken.py",
        "import pandas as pd\nclean = s.valid(\n",
    ));
    files.push(SourceFile::new(".venv/lib/pandas_shim.py", "import pandas as pd\n"));
    files.push(SourceFile::new("README.md", "pandas"));

    let report = pipeline.process_batch(files);

    assert_eq!(report.files_scanned, 33);
    assert_eq!(report.files_changed, 32);
    assert_eq!(report.replacements, 64);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(
        report.skipped.get("README.md").map(String::as_str),
        Some("Not a Python file")
    );
    assert!(report.failures.contains_key("signals/broken.py"));
    assert_eq!(report.modified().count(), 32);
    for (_, text) in report.modified() {
        assert_eq!(text, "import pandas as pd\nclean = s.dropna()\nm = s.rolling(5).mean()\n");
    }
}

#[test]
fn test_batch_report_serializes() {
    let pipeline = RewritePipeline::new(MigrateConfig::default()).expect("pipeline");
    let report = pipeline.process_batch(vec![SourceFile::new(
        "a.py",
        "import pandas as pd\nx = df.as_matrix()\n",
    )]);
    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["files_changed"], 1);
    assert_eq!(json["outcomes"]["a.py"]["text"], "import pandas as pd\nx = df.values\n");
}

#[test]
fn test_path_filter_reasons() {
    assert!(is_safe_to_modify(Path::new("research/momentum.py")).is_ok());
    assert_eq!(
        is_safe_to_modify(Path::new("project/build/lib/mod.py")),
        Err(SkipReason::ForbiddenDirectory("build".to_string()))
    );
    assert_eq!(
        is_safe_to_modify(Path::new("pkg/foo.egg-info/mod.py")),
        Err(SkipReason::ForbiddenDirectory("foo.egg-info".to_string()))
    );
    assert_eq!(
        is_safe_to_modify(Path::new("app/db/migrations/0001_initial.py")),
        Err(SkipReason::ForbiddenPattern("/migrations/".to_string()))
    );
    assert_eq!(
        is_safe_to_modify(Path::new("app/logging_config.py")),
        Err(SkipReason::PossibleConfiguration)
    );
}

#[test]
fn test_changed_lines_of_a_rewrite() {
    let original = "import pandas as pd\nx = s.valid()\n";
    let pipeline = RewritePipeline::new(MigrateConfig::default()).expect("pipeline");
    let outcome = pipeline.rewrite(original);

    let changes = changed_lines(original, &outcome.text);
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].tag, LineTag::Removed);
    assert_eq!(changes[0].line, 2);
    assert_eq!(changes[0].content, "x = s.valid()");
    assert_eq!(changes[1].tag, LineTag::Added);
    assert_eq!(changes[1].content, "x = s.dropna()");
}
