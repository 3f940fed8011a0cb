//! Literal `{{KEY}}` placeholder substitution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex"));

/// Replace every `{{KEY}}` occurrence with `variables[KEY]`.
///
/// Placeholders with no matching variable are left verbatim in the output.
/// That silent-miss behavior is load-bearing (bootstrap scripts downstream
/// tolerate the literal text); a warning is emitted so the miss is at least
/// visible in logs.
pub fn render(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut output = template.to_string();
    for (key, value) in variables {
        output = output.replace(&format!("{{{{{key}}}}}"), value);
    }

    for caps in PLACEHOLDER_RE.captures_iter(&output) {
        warn!(placeholder = &caps[1], "unresolved bootstrap placeholder");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_every_occurrence() {
        let rendered = render(
            "cluster={{NAME}} service={{NAME}}_{{ROLE}}",
            &vars(&[("NAME", "analytics"), ("ROLE", "data")]),
        );
        assert_eq!(rendered, "cluster=analytics service=analytics_data");
    }

    #[test]
    fn empty_variables_is_identity_without_placeholders() {
        let template = "#!/bin/bash\necho hello\n";
        assert_eq!(render(template, &BTreeMap::new()), template);
    }

    #[test]
    fn missing_variable_leaves_placeholder_verbatim() {
        let rendered = render("endpoint={{RDS_ADDRESS_ENDPOINT}}", &BTreeMap::new());
        assert_eq!(rendered, "endpoint={{RDS_ADDRESS_ENDPOINT}}");
    }

    #[test]
    fn substitution_is_sequential_chained_replace() {
        // Placeholder-shaped text introduced by an earlier substitution is
        // visible to later keys. Pin the chained-replace semantics.
        let rendered = render("x={{A}}", &vars(&[("A", "{{B}}"), ("B", "chained")]));
        assert_eq!(rendered, "x=chained");
    }
}
