//! Prompt text for each stage. Reply schemas come from the stage output types.

use crate::types::Label;
use falseguard_search::SearchOutcome;
use url::Url;

pub const FACT_CHECK_SYSTEM_PROMPT: &str = "You are an objective, unbiased fact-checking assistant. \
Judge claims on evidence, not on tone or source reputation. Always answer with strict JSON.";

pub fn classify(content: &str) -> String {
    format!(
        r#"You are an expert in text analysis. Your primary task is to determine if the user has provided a news article for fact-checking or if they are asking a general question.

Analyze the following text:
Text: {content}

- If the text appears to be a news article (i.e., it has a headline, paragraphs, and reports on events), classify it as "Real" or "Fake" based on its likely veracity.
- If the text is clearly a question (e.g., starts with "what is," "who is," "explain," etc.), classify it as a "Question".

The confidence score must be between 0 and 1."#
    )
}

pub fn explain(content: &str, label: Label) -> String {
    format!(
        r#"Explain why the following news article was classified as {label}.

Article Content: {content}
Classification: {label}

Provide a concise explanation justifying the classification, a confidence score (0-1) for the classification, and any available evidence.
The confidence score represents how sure you are that the Classification is correct."#
    )
}

pub fn search_query(content: &str, label: Label, source_url: Option<&Url>) -> String {
    let source = source_url
        .map(|u| format!("\nSource URL: {u}"))
        .unwrap_or_default();
    format!(
        r#"Read the article below and identify its core topic and main claims.
Synthesize those claims into a concise and specific web search query (5-10 words) that is likely to find relevant fact-checking articles.
For example, if the article claims "Studies show chocolate cures cancer", a good query would be "chocolate cures cancer fact check".

Article: {content}
Classification: {label}{source}"#
    )
}

/// Final evidence prompt. `outcome` must hold at least one result; the
/// error and empty branches never reach the model.
pub fn evidence(
    content: &str,
    label: Label,
    source_url: Option<&Url>,
    query: &str,
    outcome: &SearchOutcome,
) -> String {
    let source = source_url
        .map(|u| format!("\nSource URL: {u}"))
        .unwrap_or_default();
    let results = serde_json::to_string_pretty(outcome).unwrap_or_default();
    format!(
        r#"You are a world-class fact-checking AI. A live web search has already been run for the article below; its results are attached. DO NOT ANSWER FROM MEMORY.

**Article to Analyze:**
Article: {content}
Classification: {label}{source}

**Web search query:** {query}

**Web search results:**
{results}

Write a "counterResponse" based entirely on the information from these results.
- If the article is fake, debunk its claims: explain what is incorrect and provide the corrected information.
- If the article is real, state which facts the sources support.
Give a "confidenceScore" between 0 and 1 for how confident you are in the counterResponse."#
    )
}

pub fn answer_question(question: &str) -> String {
    format!(
        "You are a helpful and knowledgeable AI assistant. Provide a comprehensive and detailed answer to the following question, formatted nicely for readability (e.g., with paragraphs or lists).\n\nQuestion: {question}\n\nYour answer should be inside the \"answer\" field."
    )
}

pub fn media(question: Option<&str>) -> String {
    let task = match question {
        Some(q) => format!(
            r#"The user has a specific question about this file: "{q}"
Your task is to answer this question based on the file's content.
- In the "reasoning" field, provide a direct answer to the user's question.
- In the "isFakeNews" field, determine if the content related to the question is misleading or fake. Set to false if the question is neutral (e.g., a summary request).
- Provide a "confidenceScore" for your analysis.
- If applicable, use the "evidence" field to provide specific details or quotes from the document that support your answer."#
        ),
        None => r#"Your task is to analyze the provided file for fake news indicators.
- In the "isFakeNews" field, determine if the content contains fake news indicators.
- In the "reasoning" field, provide your reasoning for this classification.
- Provide a "confidenceScore" (0 to 1).
- Use the "evidence" field to detail any specific evidence supporting your classification."#
            .to_string(),
    };
    format!(
        "You are an expert AI assistant specializing in analyzing documents and images.\nAnalyze the content of the attached file (PDF document or photo).\n\n{task}"
    )
}
