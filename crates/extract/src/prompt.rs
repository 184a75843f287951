pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract named entities from the following text.

INSTRUCTIONS:
1. Identify key entities (people, organizations, locations, dates, amounts, products, events, concepts)
2. Use the EXACT substring from the text for each entity, no paraphrasing
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
[
  {{"extraction_class": "person", "extraction_text": "exact text", "attributes": {{"key": "value"}}}}
]

RULES:
- extraction_class is a short lowercase label (person, organization, location, date, amount, ...)
- attributes is an object with helpful details, or {{}} if there are none
- Keep the order in which entities appear in the text
- Output ONLY the JSON array, no markdown, no explanations

TEXT:
{}

JSON OUTPUT:"#,
        text
    )
}

pub fn build_optimize_prompt(text: &str) -> String {
    format!(
        r#"Rewrite the following text so that its information is easier to extract.

INSTRUCTIONS:
1. Keep every fact from the original; do not invent new ones
2. Name entities explicitly instead of using pronouns or vague references
3. Prefer short declarative sentences, one fact per sentence
4. Write dates, amounts and names in full

Output ONLY the rewritten text with no preamble, no markdown, no explanations.

TEXT:
{}

REWRITTEN TEXT:"#,
        text
    )
}
