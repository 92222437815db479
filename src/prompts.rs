//! Prompt templates for the three model calls.
//!
//! Every prompt lives here so the wording can change without touching the
//! steps that send them, and so tests can inspect the exact text a step
//! would send.

use crate::merge::DiagramInput;

/// Instruction sent by the refinement step. `{notes}` is replaced with the raw notes.
pub const REFINE_TEMPLATE: &str = "Refine these raw notes into clean, structured Markdown.
Use headers, bullets, and bold text. Keep all information.

Raw Notes:
{notes}";

/// Instruction sent by the diagram step. `{content}` is replaced with the notes.
pub const DIAGRAM_TEMPLATE: &str = "Analyze this text and generate a Mermaid.js diagram (graph TD or sequenceDiagram)
that represents the system architecture or flow.
Return ONLY the Mermaid code, no markdown code blocks.

Text:
{content}";

/// Build the refinement prompt.
pub fn refine_prompt(raw_notes: &str) -> String {
    REFINE_TEMPLATE.replace("{notes}", raw_notes)
}

/// Build the diagram prompt.
pub fn diagram_prompt(content: &str) -> String {
    DIAGRAM_TEMPLATE.replace("{content}", content)
}

/// Build the merge prompt for two or more diagrams.
///
/// Each diagram appears as a `### <label>` heading followed by a fenced
/// `mermaid` block, in input order.
pub fn merge_prompt(diagrams: &[DiagramInput], title: &str) -> String {
    let diagrams_text = diagrams
        .iter()
        .map(|d| format!("### {}\n```mermaid\n{}\n```", d.label, d.diagram_code))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an expert at creating Mermaid.js architecture diagrams.

I have {count} separate architecture diagrams that I need you to combine
into ONE unified system architecture diagram titled "{title}".

Requirements:
1. Create a single cohesive graph TD diagram
2. Group each original diagram as a named subgraph
3. Identify logical connections BETWEEN the different systems
4. Use consistent styling and clear node names
5. Add a main title subgraph wrapping everything
6. Keep node labels concise but descriptive
7. Return ONLY the Mermaid code, no markdown blocks or explanations

Here are the diagrams to combine:

{diagrams_text}

Generate the combined Mermaid diagram:"#,
        count = diagrams.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_prompt_embeds_notes() {
        let p = refine_prompt("meeting notes here");
        assert!(p.contains("Keep all information"));
        assert!(p.ends_with("meeting notes here"));
    }

    #[test]
    fn diagram_prompt_forbids_fences() {
        let p = diagram_prompt("text");
        assert!(p.contains("no markdown code blocks"));
        assert!(p.contains("graph TD or sequenceDiagram"));
    }

    #[test]
    fn merge_prompt_lists_each_diagram_in_order() {
        let diagrams = vec![
            DiagramInput::new("PersonaPlex", "graph TD; a-->b"),
            DiagramInput::new("MemoRAG", "graph TD; c-->d"),
        ];
        let p = merge_prompt(&diagrams, "Unified Architecture");
        assert!(p.contains("I have 2 separate"));
        assert!(p.contains("titled \"Unified Architecture\""));
        let first = p.find("### PersonaPlex\n```mermaid\ngraph TD; a-->b\n```").unwrap();
        let second = p.find("### MemoRAG\n```mermaid\ngraph TD; c-->d\n```").unwrap();
        assert!(first < second);
    }
}
