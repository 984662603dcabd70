//! Prompts for classifying manual images with a vision LLM.
//!
//! Callers can override the system prompt via
//! [`crate::config::VisionConfig::system_prompt`]; the JSON contract it
//! describes must stay the same, because [`crate::pipeline::vision`] parses
//! the reply against it.

/// Default system prompt for image classification.
pub const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are an assistant that reads product assembly manuals.

You receive the text of a manual and a numbered list of images extracted from it.
For EVERY image decide whether it depicts an instructional step a person must
perform (for example: attaching a part, tightening a screw, inserting a bracket).
Cover pages, part inventories, safety pictograms, logos and blank pages are NOT
instructional.

Reply with ONE JSON object and nothing else:

{
  "matches": [
    {
      "image_index": 0,
      "is_instruction": true,
      "instruction_title": "Short imperative title, e.g. Attach Legs",
      "instruction_description": "One or two sentences telling the reader what to do, using the manual text when it applies."
    }
  ]
}

Rules:
- Include exactly one entry per image, in image order, with its 0-based image_index.
- For non-instructional images set is_instruction to false and leave title and description empty.
- Do NOT wrap the JSON in markdown fences and do NOT add commentary."#;

/// Build the user turn: the manual text followed by the image list.
pub fn build_user_prompt(instructions: &str, image_filenames: &[String]) -> String {
    let mut prompt = String::from("Manual text:\n\"\"\"\n");
    prompt.push_str(instructions.trim());
    prompt.push_str("\n\"\"\"\n\nImages (attached in this order):\n");
    for (i, name) in image_filenames.iter().enumerate() {
        let short = std::path::Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        prompt.push_str(&format!("{i}: {short}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_numbers_images_from_zero() {
        let p = build_user_prompt(
            "  Step 1: attach legs  ",
            &["volume/abc/images/page-001.png".into(), "volume/abc/images/page-002.png".into()],
        );
        assert!(p.contains("Step 1: attach legs\n"));
        assert!(p.contains("0: page-001.png\n"));
        assert!(p.contains("1: page-002.png\n"));
    }

    #[test]
    fn system_prompt_names_every_field() {
        for field in ["image_index", "is_instruction", "instruction_title", "instruction_description"] {
            assert!(CLASSIFY_SYSTEM_PROMPT.contains(field), "missing {field}");
        }
    }
}
