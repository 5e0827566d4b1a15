//! Stage Prompt Builder
//!
//! Composes the directive for a stage: role framing, then instructions
//! (including the concrete task with the topic and upstream material), then
//! output format. Pure string assembly, so identical inputs always produce
//! identical directives.

use crate::agents::roles::StageRole;
use crate::search::tool::TOOL_NAME;

pub const ROLE_HEADING: &str = "# Role";
pub const INSTRUCTIONS_HEADING: &str = "# Instructions";
pub const OUTPUT_HEADING: &str = "# Output Format";

/// Three-section system prompt
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPromptBuilder {
    pub role_description: String,
    pub core_instructions: String,
    pub output_instructions: String,
}

impl SystemPromptBuilder {
    pub fn new(
        role_description: impl Into<String>,
        core_instructions: impl Into<String>,
        output_instructions: impl Into<String>,
    ) -> Self {
        Self {
            role_description: role_description.into(),
            core_instructions: core_instructions.into(),
            output_instructions: output_instructions.into(),
        }
    }

    pub fn build(&self) -> String {
        format!(
            "{ROLE_HEADING}\n{}\n\n{INSTRUCTIONS_HEADING}\n{}\n\n{OUTPUT_HEADING}\n{}",
            self.role_description.trim(),
            self.core_instructions.trim(),
            self.output_instructions.trim()
        )
    }
}

pub struct StagePromptBuilder;

impl StagePromptBuilder {
    /// Build the directive for `role`
    pub fn build(
        role: StageRole,
        topic: &str,
        prior_stage_text: Option<&str>,
        supplementary_context: Option<&str>,
    ) -> String {
        let task = Self::task(role, topic, prior_stage_text, supplementary_context);
        let instructions = format!("{}\n\n{}", role.core_instructions(), task);

        SystemPromptBuilder::new(role.role_description(), instructions, role.output_instructions()).build()
    }

    /// The user turn that sets the stage running
    pub fn kickoff_message(role: StageRole, topic: &str) -> String {
        format!(
            "Carry out the {} stage for the topic \"{}\" as described in your instructions.",
            role.stage_name(),
            topic
        )
    }

    fn task(role: StageRole, topic: &str, prior: Option<&str>, context: Option<&str>) -> String {
        let prior = prior.unwrap_or_default();
        let context = context.unwrap_or_default();

        match role {
            StageRole::Researcher => format!(
                "Research task: Analyze these search results about {topic}.\n\n\
                 {context}\n\n\
                 Organize these findings into clear research with reliable sources. \
                 Include the significance of each development and its broader industry impact. \
                 If you need more specific information, use the {TOOL_NAME} tool with a specific query."
            ),
            StageRole::InsightsExpert => format!(
                "Add insights to the following research about {topic}.\n\n\
                 Research to analyze:\n{prior}\n\n\
                 Also consider these additional search results:\n{context}\n\n\
                 If you need any specific information, use the {TOOL_NAME} tool with a specific query."
            ),
            StageRole::Writer => format!(
                "Transform these insights about {topic} into engaging newsletter content:\n\n{prior}"
            ),
            StageRole::Editor => format!(
                "Proofread and refine this newsletter draft about {topic}. \
                 Ensure all sources are properly cited and the content is engaging and informative:\n\n{prior}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_order(directive: &str) -> (usize, usize, usize) {
        (
            directive.find(ROLE_HEADING).unwrap(),
            directive.find(INSTRUCTIONS_HEADING).unwrap(),
            directive.find(OUTPUT_HEADING).unwrap(),
        )
    }

    #[test]
    fn test_sections_in_order_for_every_role() {
        for role in StageRole::ALL {
            let directive = StagePromptBuilder::build(role, "robotics", Some("prior"), Some("context"));
            let (r, i, o) = section_order(&directive);
            assert!(r < i && i < o, "bad section order for {}", role);
            assert!(directive.contains(role.role_description()));
            assert!(directive.contains("robotics"));
        }
    }

    #[test]
    fn test_search_tool_offered_only_to_early_stages() {
        for role in StageRole::ALL {
            let directive = StagePromptBuilder::build(role, "robotics", Some("prior"), Some("context"));
            assert_eq!(directive.contains(TOOL_NAME), role.uses_search_tool(), "role {}", role);
        }
    }

    #[test]
    fn test_inputs_land_in_instructions() {
        let directive = StagePromptBuilder::build(
            StageRole::InsightsExpert,
            "robotics",
            Some("RESEARCH BODY"),
            Some("CONTEXT BODY"),
        );
        let (_, instructions, output) = section_order(&directive);
        let research_at = directive.find("RESEARCH BODY").unwrap();
        let context_at = directive.find("CONTEXT BODY").unwrap();
        assert!(instructions < research_at && research_at < context_at && context_at < output);

        let writer = StagePromptBuilder::build(StageRole::Writer, "robotics", Some("INSIGHTS"), None);
        assert!(writer.contains("INSIGHTS"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = StagePromptBuilder::build(StageRole::Editor, "quantum", Some("draft"), None);
        let b = StagePromptBuilder::build(StageRole::Editor, "quantum", Some("draft"), None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_kickoff_names_stage() {
        let message = StagePromptBuilder::kickoff_message(StageRole::InsightsExpert, "quantum");
        assert!(message.contains("insights"));
        assert!(message.contains("quantum"));
    }
}
