//! Interactive chatbot session for the terminal.

use crate::data::text::text_block;
use crate::data::CoffeeData;
use crate::error::Result;
use crate::llm::{Explanation, ExplanationAdapter};
use crate::resolver::{is_blank_query, resolve, QueryAnswer, Resolution};
use std::io::{BufRead, Write};

/// Shortcut command, the query it stands for, and its label.
pub const SHORTCUTS: [(&str, &str, &str); 3] = [
    ("/cold", "cold drinks", "Cold Drinks"),
    ("/hot", "hot drinks", "Hot Drinks"),
    ("/menu", "show all drinks", "Full Menu"),
];

pub const EXAMPLE_QUESTIONS: [&str; 4] = ["Cold drinks", "Hot drinks", "Show all drinks", "Latte"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Ask(String),
    /// Explicit `/clear` or an empty line; nothing is resolved.
    Clear,
    Help,
    Quit,
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if is_blank_query(trimmed) {
        return ChatInput::Clear;
    }

    let command = trimmed.to_lowercase();
    if let Some((_, query, _)) = SHORTCUTS.iter().find(|(cmd, _, _)| *cmd == command) {
        return ChatInput::Ask(query.to_string());
    }

    match command.as_str() {
        "/clear" => ChatInput::Clear,
        "/help" => ChatInput::Help,
        "/quit" | "/exit" => ChatInput::Quit,
        _ => ChatInput::Ask(trimmed.to_string()),
    }
}

/// Results as a full table (every row and column) or the resolver's message.
pub fn render_resolution(resolution: &Resolution) -> Result<String> {
    match &resolution.answer {
        QueryAnswer::Rows(df) => text_block(df),
        QueryAnswer::Message(message) => Ok(message.clone()),
    }
}

pub fn help_text(adapter: &ExplanationAdapter, use_ai: bool) -> String {
    let mut out = String::from("Coffee Shop AI Assistant\n");
    out.push_str("Explore menu items and orders. Shortcuts:\n");
    for (command, _, label) in SHORTCUTS {
        out.push_str(&format!("  {:<7} {}\n", command, label));
    }
    out.push_str("  /clear  Clear\n  /quit   Leave the session\n\nTry asking:\n");
    for example in EXAMPLE_QUESTIONS {
        out.push_str(&format!("  - {}\n", example));
    }
    out.push_str(if adapter.is_active(use_ai) {
        "\nAI answers: on\n"
    } else if adapter.is_enabled() {
        "\nAI answers: off\n"
    } else {
        "\nAI answers: disabled (no API key)\n"
    });
    out
}

/// Resolve one question and, when active, append the AI explanation.
pub async fn answer_question(
    data: &CoffeeData,
    adapter: &ExplanationAdapter,
    question: &str,
    use_ai: bool,
) -> Result<String> {
    let resolution = resolve(question, data.merged())?;
    let mut out = format!("Results\n{}\n", render_resolution(&resolution)?);

    let explanation = adapter.explain(data.merged(), question, use_ai).await;
    if let Some(text) = explanation.message() {
        let heading = match &explanation {
            Explanation::Failed => "AI Explanation (error)",
            _ => "AI Explanation",
        };
        out.push_str(&format!("\n{}\n{}\n", heading, text));
    }
    Ok(out)
}

/// Read questions line by line until `/quit` or end of input.
pub async fn run_session<R, W>(
    data: &CoffeeData,
    adapter: &ExplanationAdapter,
    use_ai: bool,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}> ", help_text(adapter, use_ai))?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_input(&line) {
            ChatInput::Quit => break,
            ChatInput::Clear => {}
            ChatInput::Help => write!(output, "{}", help_text(adapter, use_ai))?,
            ChatInput::Ask(question) => {
                let answer = answer_question(data, adapter, &question, use_ai).await?;
                writeln!(output, "{}", answer)?;
            }
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    Ok(())
}
