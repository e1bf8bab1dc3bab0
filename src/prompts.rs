//! Prompt templates for every model call the writing loop makes.
//!
//! Templates use `{name}` placeholders filled by [`render`]. Wording is a
//! tuning knob; the loop only relies on each prompt embedding its inputs and
//! on the judge markers below.

/// Judge marker meaning another iteration is needed.
pub const KEEP_EDITING: &str = "KEEP EDITING";
/// Judge marker meaning the document can be returned.
pub const RETURN_TO_REQUESTER: &str = "RETURN TO REQUESTING AGENT";

/// Substitute `{key}` placeholders in a single pass.
///
/// Values are never re-scanned, so a document that happens to contain
/// `{outline}` is embedded verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub const PLANNER_SYSTEM: &str =
    "You are the Controller module for an AI assistant built to write and revise research articles.";

pub const PLANNER_USER: &str = "# Task Description
Your task is to decide how best to write or revise the ARTICLE. Considering the ARTICLE OUTLINE, ARTICLE, and the CONVERSATION HISTORY,
use your available ROLES to decide what steps to take next. You are not responsible for writing any sections,
you are only responsible for deciding what to do next. You will delegate work to other agents via ROLES.

# Instructions
You may delegate work to one or more ROLES.
Consider the name and description of each role and decide whether or how you want to use it.
Only give instructions to relevant roles.
You can decide to invoke the same role multiple times, with different instructions.
Provide role instructions that are relevant towards completing your TASK.
If the ARTICLE has fewer than {min_words} words, give instructions to expand relevant sections.
You will also give each role invocation a score out of 10, so that their execution can be prioritized.

## ROLES (provided as a list of role names and descriptions)
{roles}

## CONVERSATION HISTORY
{history}

## ARTICLE OUTLINE
{outline}

## ARTICLE
{document}

# Controller Decision formatted precisely as one line per invocation: {role name};{score out of 10};{instructions on a single line}
";

pub const OUTLINE_TASK_SYSTEM: &str = "You are an expert research writer and editor. Your role is to create and refine the outlines of research articles in markdown format.";

pub const OUTLINE_TASK_USER: &str = "# Task Description
Your task is to write or revise the outline of a research article.
First consider the CONVERSATION HISTORY and ARTICLE OUTLINE.
Then consider the INSTRUCTIONS and write a NEW OR IMPROVED OUTLINE for the article.
Always write the outline in markdown using appropriate section headers.

## CONVERSATION HISTORY
{history}

## ARTICLE OUTLINE
{outline}

## ITERATION
{iteration}

## INSTRUCTIONS
{instruction}

## NEW OR IMPROVED OUTLINE
";

pub const SECTION_TASK_SYSTEM: &str = "You are an expert research writer and editor. Your role is to write or revise detailed sections of research articles in markdown format.";

pub const SECTION_TASK_USER: &str = "# Task Description
Your task is to write specific sections of research articles using your own knowledge.
First consider the CONVERSATION HISTORY, ARTICLE OUTLINE, ARTICLE, and INSTRUCTIONS.
Then revise the article according to the context and instructions provided below.
The entire REVISED ARTICLE should be written using markdown formatting.

## CONVERSATION HISTORY
{history}

## ARTICLE OUTLINE
{outline}

## ARTICLE
{document}

## ITERATION
{iteration}

## INSTRUCTIONS
{instruction}

## REVISED ARTICLE
";

pub const OUTLINE_MERGE_SYSTEM: &str = "You are an expert-level AI writing editor. Your role is to aggregate multiple suggestions for an article outline into a single one.";

pub const OUTLINE_MERGE_USER: &str = "# Task Description
Your task is to combine one or more article outlines into a single one written in markdown format.

# Instructions
Read the CONVERSATION HISTORY, EXISTING OUTLINE, and POSSIBLE OUTLINES. Then respond with a single article outline that best combines the POSSIBLE OUTLINES.

## CONVERSATION HISTORY
{history}

## EXISTING OUTLINE
{existing}

## POSSIBLE OUTLINES
{candidates}

## OUTLINE
";

pub const DOCUMENT_MERGE_SYSTEM: &str = "You are an expert-level AI writing editor. Your role is to aggregate multiple partial articles into a single, complete article.";

pub const DOCUMENT_MERGE_USER: &str = "# Task Description
Your task is to combine one or more partial articles into a single one written in markdown format.

# Instructions
Read the CONVERSATION HISTORY, ARTICLE OUTLINE, EXISTING ARTICLE, and PARTIAL ARTICLES.
Then respond with a single article that best combines and expands the PARTIAL ARTICLES.
The resulting ARTICLE should include all sections and subsections in the ARTICLE OUTLINE.

## CONVERSATION HISTORY
{history}

## ARTICLE OUTLINE
{outline}

## EXISTING ARTICLE
{existing}

## PARTIAL ARTICLES
{candidates}

## ARTICLE
";

pub const JUDGE_SYSTEM: &str = "You are an expert-level AI writing editor. Your role is to decide whether to keep editing the ARTICLE.";

pub const JUDGE_USER: &str = "# Task Description
Your task is to decide whether:
1. To keep editing the ARTICLE, or
2. To return the article to the requesting agent.

You will use a CHECK LIST to determine whether to KEEP EDITING.

# Instructions
Consider every item in the CHECK LIST.
If any item is true, KEEP EDITING.
You must be careful and accurate when completing the CHECK LIST.

# CHECK LIST
- If the ARTICLE still has placeholders or empty sections, KEEP EDITING.
- If the ARTICLE is incoherent, KEEP EDITING.
- If there are ARTICLE subsections with fewer than three paragraphs, KEEP EDITING.
- If the ARTICLE does not include everything being requested in the CONVERSATION HISTORY, KEEP EDITING.
- If the ARTICLE does not include every section and subsection in ARTICLE OUTLINE, KEEP EDITING.
- WORD COUNT: What is the ARTICLE's word count?
- If the WORD COUNT is less than {min_words} words, KEEP EDITING.

## ARTICLE OUTLINE
{outline}

## ARTICLE
<article>
{document}
</article>

## CONVERSATION HISTORY
{history}

# Your Response (a list of all CHECK LIST results followed by exactly one of [\"KEEP EDITING\", \"RETURN TO REQUESTING AGENT\"])
";

/// Follow-up sent when the judge's answer carried neither marker.
pub const JUDGE_CLARIFY: &str = "Your previous answer did not end with a decision. Respond with exactly one of: KEEP EDITING, RETURN TO REQUESTING AGENT.";

/// Join merge candidates with numbered separators.
pub fn number_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, text)| format!("### CANDIDATE {}\n{}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
