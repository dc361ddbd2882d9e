//! Tests for ImportInjector.

use omni_migrate::{ADD_IMPORTS, ImportInjector, ImportRequirement};

#[test]
fn test_inserts_after_last_top_level_import() {
    let text = "import os\nimport pandas as pd\n\n\ndef f():\n    import numpy as np\n    return np\n";
    let (out, record) = ImportInjector::inject(
        text,
        &[ImportRequirement::new("import statsmodels.api as sm")],
    );

    assert_eq!(
        out,
        "import os\nimport pandas as pd\nimport statsmodels.api as sm\n\n\ndef f():\n    import numpy as np\n    return np\n"
    );
    let record = record.expect("record");
    assert_eq!(record.rule_name, ADD_IMPORTS);
    assert_eq!(record.count, 1);
    assert_eq!(record.lines, vec![3]);
}

#[test]
fn test_deduplicates_in_declaration_order() {
    let requirements = [
        ImportRequirement::new("from aqr.stats.ols import OLS"),
        ImportRequirement::new("import statsmodels.api as sm"),
        ImportRequirement::new("from aqr.stats.ols import OLS"),
    ];
    let (out, record) = ImportInjector::inject("import pandas as pd\nx = 1\n", &requirements);

    assert_eq!(
        out,
        "import pandas as pd\nfrom aqr.stats.ols import OLS\nimport statsmodels.api as sm\nx = 1\n"
    );
    assert_eq!(record.expect("record").lines, vec![2, 3]);
}

#[test]
fn test_existing_binding_satisfies_requirement() {
    let text = "from aqr.stats.ols import (\n    OLS,\n)\nimport statsmodels.api   as   sm\n";
    let (out, record) = ImportInjector::inject(
        text,
        &[
            ImportRequirement::new("from aqr.stats.ols import OLS"),
            ImportRequirement::new("import statsmodels.api as sm"),
        ],
    );
    assert_eq!(out, text);
    assert!(record.is_none());
}

#[test]
fn test_different_alias_does_not_satisfy() {
    let text = "from aqr.stats.ols import OLS as ols\n";
    let (out, _) = ImportInjector::inject(text, &[ImportRequirement::new("from aqr.stats.ols import OLS")]);
    assert_eq!(out, "from aqr.stats.ols import OLS as ols\nfrom aqr.stats.ols import OLS\n");
}

#[test]
fn test_docstring_and_comments_come_first() {
    let text = "#!/usr/bin/env python\n# analytics\n\"\"\"Signals.\"\"\"\nx = pd.ols(y=r, x=f)\n";
    let (out, record) =
        ImportInjector::inject(text, &[ImportRequirement::new("import pandas as pd")]);
    assert_eq!(
        out,
        "#!/usr/bin/env python\n# analytics\n\"\"\"Signals.\"\"\"\nimport pandas as pd\nx = pd.ols(y=r, x=f)\n"
    );
    assert_eq!(record.expect("record").lines, vec![4]);
}

#[test]
fn test_no_anchor_inserts_at_top() {
    let (out, _) = ImportInjector::inject("x = 1\n", &[ImportRequirement::new("import pandas as pd")]);
    assert_eq!(out, "import pandas as pd\nx = 1\n");
}

#[test]
fn test_missing_trailing_newline() {
    let (out, _) = ImportInjector::inject("import os", &[ImportRequirement::new("import sys")]);
    assert_eq!(out, "import os\nimport sys\n");
}

#[test]
fn test_marker_satisfies_requirement() {
    let requirement = ImportRequirement::new("from aqr.core.panel import Panel").with_marker("Panel");
    let (out, record) = ImportInjector::inject("from lib import Panel\n", &[requirement]);
    assert_eq!(out, "from lib import Panel\n");
    assert!(record.is_none());
}

#[test]
fn test_no_requirements_is_a_no_op() {
    let (out, record) = ImportInjector::inject("import os\n", &[]);
    assert_eq!(out, "import os\n");
    assert!(record.is_none());
}
