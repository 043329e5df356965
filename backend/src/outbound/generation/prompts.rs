//! Prompt templates for the three generation operations.

pub(crate) const DIAGNOSTIC_SYSTEM: &str = "You are an expert automotive diagnostic AI.";
pub(crate) const PARTS_SYSTEM: &str = "You are an automotive parts prediction AI.";
pub(crate) const SUMMARY_SYSTEM: &str = "You are an automotive repair communication specialist.";

/// Build the streamed diagnosis prompt for free-text symptoms or OBD codes.
pub(crate) fn diagnostic_prompt(symptoms: &str) -> String {
    format!(
        "You are an expert automotive diagnostic AI. Analyze the following \
         symptoms or OBD codes and provide a detailed diagnosis:\n\n\
         {symptoms}\n\n\
         Provide a thorough analysis including:\n\
         1. Likely causes of the issue\n\
         2. Severity level\n\
         3. Recommended next steps\n\
         4. Potential complications if left unaddressed"
    )
}

/// Build the parts prediction prompt. The model is asked for a JSON array
/// so the response can be decoded into forecasts.
pub(crate) fn parts_prompt(diagnosis: &str) -> String {
    format!(
        "Based on the following car diagnostic result, predict the most \
         likely parts that need to be replaced or repaired. For each part, \
         provide a name, confidence level (as a decimal between 0 and 1), \
         and estimated price range.\n\n\
         Diagnostic Result:\n{diagnosis}\n\n\
         Format your response as a JSON array with objects containing:\n\
         - name (string)\n\
         - confidence (number between 0-1)\n\
         - price (string with price range)"
    )
}

/// Build the customer-facing repair summary prompt.
pub(crate) fn summary_prompt(diagnosis: &str, part_names: &[String], notes: Option<&str>) -> String {
    let parts_text = if part_names.is_empty() {
        "No parts identified for replacement".to_owned()
    } else {
        part_names.join(", ")
    };
    let notes_text = notes.unwrap_or("No additional notes provided");

    format!(
        "Create a clear, customer-friendly repair summary based on the \
         following information:\n\n\
         Diagnostic Result:\n{diagnosis}\n\n\
         Parts to Replace:\n{parts_text}\n\n\
         Additional Notes:\n{notes_text}\n\n\
         The summary should:\n\
         1. Explain the problem in simple terms\n\
         2. List the parts that need replacement\n\
         3. Explain why these repairs are necessary\n\
         4. Include any additional notes from the technician\n\
         5. Be professional but easy to understand for non-technical customers"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn diagnostic_prompt_embeds_symptoms() {
        let prompt = diagnostic_prompt("P0301 misfire");
        assert!(prompt.contains("P0301 misfire"));
    }

    #[rstest]
    fn summary_prompt_lists_parts_or_fallback() {
        let with_parts = summary_prompt("worn pads", &["Brake pads".to_owned()], None);
        assert!(with_parts.contains("Brake pads"));

        let without_parts = summary_prompt("worn pads", &[], Some("checked fluid"));
        assert!(without_parts.contains("No parts identified for replacement"));
        assert!(without_parts.contains("checked fluid"));
    }
}
