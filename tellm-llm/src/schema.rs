//! Natural-language schema rendering for backends without mechanical
//! structured-output enforcement.

use crate::format::FormatField;

/// Merge free-form instructions with a strict-JSON schema hint derived from
/// the declared fields. Field order is sorted by name so the rendered prompt
/// is deterministic regardless of declaration order.
pub(crate) fn strict_json_system(fields: &[FormatField], instructions: &str) -> String {
    let instr = instructions.trim();

    if fields.is_empty() {
        return instr.to_string();
    }

    let mut sorted: Vec<&FormatField> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut hint = String::from(
        "RETURN ONLY A STRICT JSON OBJECT. NO PROSE, NO EXPLANATIONS, NO MARKDOWN.\n\
         Fields (all required): ",
    );
    for (i, field) in sorted.iter().enumerate() {
        if i > 0 {
            hint.push_str(", ");
        }
        hint.push_str(&field.name);
        hint.push_str(": ");
        hint.push_str(&field.kind.label());
    }

    if instr.is_empty() {
        hint
    } else {
        format!("{instr}\n\n{hint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::compile_format;

    #[test]
    fn no_fields_returns_trimmed_instructions_only() {
        assert_eq!(strict_json_system(&[], "  be brief  "), "be brief");
        assert_eq!(strict_json_system(&[], ""), "");
    }

    #[test]
    fn fields_are_listed_sorted_by_name() {
        let fields = compile_format("zeta:integer,alpha:string,tags:string[]").expect("valid");
        let rendered = strict_json_system(&fields, "");

        let alpha = rendered.find("alpha: string").expect("alpha listed");
        let tags = rendered.find("tags: array<string>").expect("tags listed");
        let zeta = rendered.find("zeta: integer").expect("zeta listed");
        assert!(alpha < tags && tags < zeta, "got {rendered}");
        assert!(rendered.contains("STRICT JSON OBJECT"));
        assert!(rendered.contains("all required"));
    }

    #[test]
    fn instructions_are_prepended_to_the_hint() {
        let fields = compile_format("message:string").expect("valid");
        let rendered = strict_json_system(&fields, "answer in French");
        assert!(rendered.starts_with("answer in French\n\n"));
        assert!(rendered.contains("message: string"));
    }
}
