//! Text rendering of an academic structure plan.

use std::fmt::Write;

use schoolhub_models::AcademicPlan;

/// One line per class followed by its module codes, then a summary line.
pub fn render_plan(plan: &AcademicPlan) -> String {
    let mut out = String::new();

    for class in &plan.classes {
        let modules: Vec<&str> = class.modules.iter().map(|m| m.code.as_str()).collect();
        let _ = writeln!(out, "{:<14} {:<28} {}", class.name, class.username, modules.join(" "));
    }

    let _ = writeln!(
        out,
        "\n{} classes, {} modules",
        plan.classes.len(),
        plan.module_count()
    );
    out
}

/// Splits a comma separated flag value, dropping empty entries.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_models::curriculum::ALevelSelection;
    use schoolhub_models::{AcademicSelection, plan_academic_structure};

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("PCM, MEG,,")), vec!["PCM", "MEG"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_render_plan_lists_every_class() {
        let selection = AcademicSelection {
            a_level: Some(ALevelSelection {
                combinations: vec!["PCM".to_string()],
            }),
            ..Default::default()
        };
        let plan = plan_academic_structure("hill", &selection).unwrap();
        let text = render_plan(&plan);

        assert!(text.contains("S4 PCM"));
        assert!(text.contains("hill-s6-pcm"));
        assert!(text.contains("PHY CHE MATH GS ENT ENG"));
        assert!(text.ends_with("3 classes, 18 modules\n"));
    }
}
