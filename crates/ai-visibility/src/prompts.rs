/// Framing for the first call: the answer whose visibility is being measured.
pub fn initial_answer_prompt(user_prompt: &str) -> String {
    format!(
        r#"You are an expert in proxy services and web data collection.
Analyze and compare different proxy service providers objectively.

Given the query "{user_prompt}", provide a detailed analysis of proxy service providers.
Consider features, reliability, infrastructure, and market presence of major players in the industry.
Focus on technical capabilities and service offerings. Discuss strengths and weaknesses of different providers."#
    )
}

/// Instruction for the second call, which turns the answer into an `Analysis`.
///
/// The JSON template here and `extractor::parse_analysis` must agree on key names.
pub fn analysis_extraction_prompt(answer: &str) -> String {
    format!(
        r#"Analyze this text about proxy providers and extract:
1. All company names and their aliases/variations (e.g., "Luminati Networks" and "Bright Data" are the same company)
2. The order in which companies are first mentioned
3. Any statements about market leadership, industry position, or being the best/top provider

IMPORTANT: Your response must be in valid JSON format. Do not include any additional text, only the JSON object.

Format your response exactly like this:
{{
  "companyAliases": [{{"mainName": "string", "aliases": ["string"]}}],
  "mentionOrder": ["string"],
  "leadershipStatements": [{{"company": "string", "statement": "string"}}]
}}

Text to analyze:
{answer}"#
    )
}
