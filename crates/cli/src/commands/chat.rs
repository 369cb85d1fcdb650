use std::io::{self, BufRead, Write};
use std::sync::Arc;

use calorizz_agent::{client_from_config, AgentRuntime, Conversation};
use calorizz_core::config::{AppConfig, LogFormat};
use calorizz_core::domain::chat::{FAREWELL_LINE, GREETING_LINE};
use calorizz_db::SqlProductRepository;
use tokio::runtime::Runtime;

use crate::commands::{current_thread_runtime, load_config, open_migrated_pool, CommandResult};

const EXIT_WORDS: &[&str] = &["exit", "quit"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Farewell,
    EndOfInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub messages: usize,
    pub ended_by: SessionEnd,
}

pub fn run() -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    init_logging(&config);

    let runtime = match current_thread_runtime("chat") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let pool = match runtime.block_on(open_migrated_pool(&config)) {
        Ok(pool) => pool,
        Err(error) => return error.into_result("chat"),
    };

    let llm = match client_from_config(&config.llm) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure("chat", "llm_client", error.to_string(), 2);
        }
    };
    let agent = AgentRuntime::new(
        llm,
        Arc::new(SqlProductRepository::new(pool.clone())),
        config.chat.lookup_limit,
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let session = run_loop(&runtime, &agent, stdin.lock(), &mut stdout, config.chat.wrap_width);
    runtime.block_on(pool.close());

    match session {
        Ok(_) => CommandResult::quiet_success(),
        Err(error) => CommandResult::failure("chat", "terminal_io", error.to_string(), 3),
    }
}

/// Interactive loop over `input`; one conversation lives for the whole session.
///
/// `exit`/`quit` prints the farewell without calling the model. Blank lines are
/// ignored and EOF ends the session quietly.
pub fn run_loop<R: BufRead, W: Write>(
    runtime: &Runtime,
    agent: &AgentRuntime,
    input: R,
    output: &mut W,
    wrap_width: usize,
) -> io::Result<SessionSummary> {
    let mut conversation = Conversation::new();
    let mut messages = 0;
    let mut lines = input.lines();

    writeln!(output, "{GREETING_LINE}")?;

    loop {
        writeln!(output)?;
        write!(output, "You: ")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(output)?;
            return Ok(SessionSummary { messages, ended_by: SessionEnd::EndOfInput });
        };
        let message = line.trim();

        if is_exit_command(message) {
            writeln!(output, "{FAREWELL_LINE}")?;
            return Ok(SessionSummary { messages, ended_by: SessionEnd::Farewell });
        }
        if message.is_empty() {
            continue;
        }

        let reply = runtime.block_on(agent.handle_in_conversation(&mut conversation, message));
        messages += 1;
        writeln!(output, "Ri: {}", wrap_text(&reply.reply, wrap_width))?;
    }
}

pub fn is_exit_command(message: &str) -> bool {
    let message = message.trim();
    EXIT_WORDS.iter().any(|word| message.eq_ignore_ascii_case(word))
}

/// Greedy word wrap that collapses whitespace; words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars = word.chars().collect::<Vec<_>>();

        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines.join("\n")
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.chat.log_level.parse::<Level>().unwrap_or(Level::WARN);
    let builder =
        tracing_subscriber::fmt().with_writer(io::stderr).with_target(false).with_max_level(log_level);

    // Ignored when a subscriber is already installed.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use calorizz_agent::llm::ScriptedLlmClient;
    use calorizz_agent::AgentRuntime;
    use calorizz_core::domain::chat::{FAREWELL_LINE, GREETING_LINE};
    use calorizz_core::domain::product::Product;
    use calorizz_db::InMemoryProductRepository;
    use rust_decimal::Decimal;

    use super::{is_exit_command, run_loop, wrap_text, SessionEnd};

    fn current_thread() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime")
    }

    #[test]
    fn exit_words_are_case_insensitive_and_trimmed() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(!is_exit_command("exit please"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn exit_prints_farewell_without_model_calls() {
        let runtime = current_thread();
        let llm = Arc::new(ScriptedLlmClient::default());
        let agent =
            AgentRuntime::new(llm.clone(), Arc::new(InMemoryProductRepository::default()), 5);
        let mut output = Vec::new();

        let summary = run_loop(&runtime, &agent, Cursor::new("exit\nhalo\n"), &mut output, 100)
            .expect("session");

        let printed = String::from_utf8(output).expect("utf8");
        assert_eq!(summary.ended_by, SessionEnd::Farewell);
        assert_eq!(summary.messages, 0);
        assert!(printed.starts_with(GREETING_LINE));
        assert!(printed.trim_end().ends_with(FAREWELL_LINE));
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn messages_share_one_conversation_until_eof() {
        let runtime = current_thread();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            Ok("YES|ayam goreng".to_string()),
            Ok("Ada dong Ayam Goreng Rp 15000~".to_string()),
            Ok("NO|none".to_string()),
            Ok("Sama-sama~".to_string()),
        ]));
        let repo = Arc::new(InMemoryProductRepository::with_products(vec![Product::new(
            "Ayam Goreng",
            Decimal::new(15000, 0),
            "crispy",
        )]));
        let agent = AgentRuntime::new(llm.clone(), repo.clone(), 5);
        let mut output = Vec::new();

        let summary = run_loop(
            &runtime,
            &agent,
            Cursor::new("apakah ada ayam goreng?\n\n   \nmakasih\n"),
            &mut output,
            100,
        )
        .expect("session");

        let printed = String::from_utf8(output).expect("utf8");
        assert_eq!(summary.ended_by, SessionEnd::EndOfInput);
        assert_eq!(summary.messages, 2);
        assert_eq!(repo.search_count(), 1);
        assert!(printed.contains("Ri: Ada dong Ayam Goreng Rp 15000~"));
        assert!(printed.contains("Ri: Sama-sama~"));

        let last_generation = llm.requests().pop().expect("generation request");
        let history = last_generation.turns.iter().map(|turn| turn.text.as_str()).collect::<Vec<_>>();
        assert!(history.contains(&"Ada dong Ayam Goreng Rp 15000~"));
        assert_eq!(history.last(), Some(&"makasih"));
    }

    #[test]
    fn wrap_text_breaks_on_word_boundaries() {
        assert_eq!(wrap_text("satu dua tiga empat", 9), "satu dua\ntiga\nempat");
        assert_eq!(wrap_text("  banyak   spasi\n\ndi sini ", 100), "banyak spasi di sini");
    }

    #[test]
    fn wrap_text_splits_words_longer_than_width() {
        assert_eq!(wrap_text("abcdefghij xy", 4), "abcd\nefgh\nij\nxy");
    }

    #[test]
    fn wrapped_lines_never_exceed_width() {
        let text = "Ri punya banyak rekomendasi makanan enak hari ini~ ".repeat(12);

        let wrapped = wrap_text(&text, 40);

        assert!(wrapped.lines().all(|line| line.chars().count() <= 40));
        assert_eq!(wrapped.split_whitespace().count(), text.split_whitespace().count());
    }
}
