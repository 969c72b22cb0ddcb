//! Terminal front end for the quiz client
//!
//! Reads commands from stdin, one per line, and prints frames and notices
//! to stdout as text or JSON lines. Logs go to stderr.

use std::{cell::RefCell, sync::Arc};

use anyhow::Context;
use itertools::Itertools;
use quizclock::{
    client::HttpQuizService,
    config::{Config, OutputMode},
    constants::quiz::DEFAULT_QUESTION_COUNT,
    controller::{Controller, END_QUIZ_PROMPT, State},
    runtime::{Driver, Handle, Intent},
    tunnel::{Answered, Feedback, Frame, Notice, Severity, Tunnel},
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Intent(Intent),
    /// End the quiz once the user confirms
    End,
    Help,
}

const HELP: &str = "\
Commands:
  start N   start a quiz with N questions (1-25)
  1-9       select an option
  s, enter  submit the selected option
  q         end the quiz early
  r         restart
  results   reload the results
  exit      quit";

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_ascii_lowercase();
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next()) {
        (None, None) | (Some("s" | "submit"), None) => Command::Intent(Intent::Submit),
        (Some("start"), None) => Command::Intent(Intent::Start(DEFAULT_QUESTION_COUNT)),
        (Some("start"), Some(count)) => Command::Intent(Intent::Start(count.parse().ok()?)),
        (Some("q" | "quit" | "end"), None) => Command::End,
        (Some("r" | "restart"), None) => Command::Intent(Intent::Restart),
        (Some("results"), None) => Command::Intent(Intent::ReloadResults),
        (Some("exit"), None) => Command::Intent(Intent::Quit),
        (Some("h" | "help" | "?"), None) => Command::Help,
        (Some(digit), None) => match digit.parse::<usize>() {
            Ok(n @ 1..=9) => Command::Intent(Intent::Select(n - 1)),
            _ => return None,
        },
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Human-readable output
#[derive(Debug, Default)]
struct TextTunnel {
    last: RefCell<Option<Frame>>,
}

impl TextTunnel {
    /// Whether `frame` differs from the last one in more than the clock
    fn is_new_screen(&self, frame: &Frame) -> bool {
        self.last.borrow().as_ref().is_none_or(|last| {
            last.state != frame.state
                || last.question != frame.question
                || last.selection != frame.selection
                || last.feedback != frame.feedback
                || last.results != frame.results
        })
    }

    fn print_question(frame: &Frame) {
        let Some(question) = &frame.question else {
            return;
        };
        let mut header = match frame.position {
            Some((number, total)) => format!("Question {number} of {total}"),
            None => "Question".to_string(),
        };
        header.push_str(&format!("  |  Score: {}", frame.score));
        if let Some(remaining) = frame.time_remaining {
            header.push_str(&format!("  |  {remaining}s"));
        }
        println!("\n{header}\n{}", question.text());
        for (i, option) in question.options().iter().enumerate() {
            let mark = if frame.selection.index() == Some(i) {
                "x"
            } else {
                " "
            };
            println!("  [{mark}] {}. {option}", i + 1);
        }
    }

    fn print_results(frame: &Frame) {
        let Some(results) = &frame.results else {
            println!("\nLoading results... (type `results` to retry)");
            return;
        };
        let total = results
            .total_questions
            .map_or_else(String::new, |t| format!(" of {t}"));
        println!(
            "\nQuiz complete!\n  Score: {}\n  Correct: {}{total}\n  Accuracy: {}%\n  Time: {}s\n  {}",
            results.score,
            results.correct_answer_count,
            results.accuracy_percentage,
            results.duration_seconds,
            results.performance().message(),
        );
        if !results.answer_details.is_empty() {
            println!("{}", results.detail_lines().iter().map(|l| format!("  {l}")).join("\n"));
        }
        println!("Type `r` to play again or `exit` to quit.");
    }
}

impl Tunnel for TextTunnel {
    fn render(&self, frame: &Frame) {
        if !self.is_new_screen(frame) {
            // Only the clock moved.
            if let Some(remaining) = frame.time_remaining {
                if frame.warning {
                    println!("  {remaining}s left!");
                } else if remaining % 10 == 0 {
                    println!("  {remaining}s left");
                }
            }
            self.last.replace(Some(frame.clone()));
            return;
        }

        match frame.state {
            State::Idle => println!(
                "\nWelcome! Type `start N` to begin a quiz with N questions, or `help`."
            ),
            State::AwaitingStart => println!("Starting quiz..."),
            State::InProgress => Self::print_question(frame),
            State::SubmissionPending => println!("Submitting..."),
            State::ShowingFeedback => {
                if let Some(Feedback {
                    is_correct: false,
                    correct_answer_index: Some(index),
                }) = frame.feedback
                {
                    let option = frame
                        .question
                        .as_ref()
                        .and_then(|q| q.options().get(index))
                        .map_or_else(String::new, |o| format!(" {o}"));
                    println!("  The correct answer was {}.{option}", index + 1);
                }
                println!("  Score: {}", frame.score);
            }
            State::ShowingResults => Self::print_results(frame),
        }
        self.last.replace(Some(frame.clone()));
    }

    fn notify(&self, notice: &Notice) {
        let prefix = match notice.severity {
            Severity::Success => "+",
            Severity::Info => "*",
            Severity::Warning => "!",
            Severity::Error => "x",
        };
        println!("[{prefix}] {}", notice.message);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Output<'a> {
    Frame(&'a Frame),
    Notice(&'a Notice),
}

/// One JSON object per line
#[derive(Debug, Default)]
struct JsonTunnel;

impl JsonTunnel {
    fn emit(output: &Output<'_>) {
        match serde_json::to_string(output) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "failed to serialize output"),
        }
    }
}

impl Tunnel for JsonTunnel {
    fn render(&self, frame: &Frame) {
        Self::emit(&Output::Frame(frame));
    }

    fn notify(&self, notice: &Notice) {
        Self::emit(&Output::Notice(notice));
    }
}

/// Forwards stdin commands to the driver until stdin closes or `exit`
async fn read_commands(handle: Handle, interactive: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "failed to read stdin");
                break;
            }
        };
        let intent = match parse_command(&line) {
            Some(Command::Intent(intent)) => intent,
            Some(Command::End) => {
                if interactive {
                    println!("{END_QUIZ_PROMPT} [y/N]");
                }
                let answer = matches!(lines.next_line().await, Ok(Some(ref l)) if is_yes(l));
                Intent::End(Answered(answer))
            }
            Some(Command::Help) => {
                println!("{HELP}");
                continue;
            }
            None => {
                if interactive {
                    println!("Unknown command `{}`; type `help`.", line.trim());
                }
                continue;
            }
        };
        if !handle.send(intent) || intent == Intent::Quit {
            return;
        }
    }
    handle.send(Intent::Quit);
}

async fn run<T: Tunnel>(tunnel: T, config: &Config) -> anyhow::Result<()> {
    let service = HttpQuizService::new(config.service_url.clone(), config.request_timeout)
        .context("failed to build quiz service client")?;
    let driver = Driver::new(
        Controller::new(config.feedback_delay),
        tunnel,
        Arc::new(service),
    );
    let reader = tokio::spawn(read_commands(
        driver.handle(),
        config.output == OutputMode::Text,
    ));

    let controller = driver.run().await;
    info!(state = ?controller.state(), score = controller.score(), "quiz client stopped");
    reader.abort();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(service = %config.service_url, "starting quiz client");

    match config.output {
        OutputMode::Text => run(TextTunnel::default(), &config).await,
        OutputMode::Json => run(JsonTunnel, &config).await,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use quizclock::quiz::Selection;

    #[test]
    fn test_parse_selection_keys() {
        assert_eq!(
            parse_command("1"),
            Some(Command::Intent(Intent::Select(0)))
        );
        assert_eq!(
            parse_command(" 9 "),
            Some(Command::Intent(Intent::Select(8)))
        );
        assert_eq!(parse_command("0"), None);
        assert_eq!(parse_command("10"), None);
    }

    #[test]
    fn test_parse_submit_keys() {
        assert_eq!(parse_command(""), Some(Command::Intent(Intent::Submit)));
        assert_eq!(parse_command("s"), Some(Command::Intent(Intent::Submit)));
        assert_eq!(parse_command("S"), Some(Command::Intent(Intent::Submit)));
    }

    #[test]
    fn test_parse_start() {
        assert_eq!(
            parse_command("start 5"),
            Some(Command::Intent(Intent::Start(5)))
        );
        assert_eq!(
            parse_command("start"),
            Some(Command::Intent(Intent::Start(DEFAULT_QUESTION_COUNT)))
        );
        // Range checking is the controller's job.
        assert_eq!(
            parse_command("start 40"),
            Some(Command::Intent(Intent::Start(40)))
        );
        assert_eq!(parse_command("start five"), None);
        assert_eq!(parse_command("start 5 6"), None);
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_command("q"), Some(Command::End));
        assert_eq!(parse_command("r"), Some(Command::Intent(Intent::Restart)));
        assert_eq!(
            parse_command("results"),
            Some(Command::Intent(Intent::ReloadResults))
        );
        assert_eq!(parse_command("exit"), Some(Command::Intent(Intent::Quit)));
        assert_eq!(parse_command("help"), Some(Command::Help));
        assert_eq!(parse_command("dance"), None);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[test]
    fn test_text_tunnel_detects_clock_only_changes() {
        let tunnel = TextTunnel::default();
        let frame = Frame {
            state: State::InProgress,
            question: None,
            position: None,
            selection: Selection::NONE,
            time_remaining: Some(30),
            warning: false,
            score: 0,
            feedback: None,
            results: None,
        };
        assert!(tunnel.is_new_screen(&frame));
        tunnel.render(&frame);

        let ticked = Frame {
            time_remaining: Some(29),
            ..frame.clone()
        };
        assert!(!tunnel.is_new_screen(&ticked));

        let selected = Frame {
            selection: Selection::of(1),
            ..frame
        };
        assert!(tunnel.is_new_screen(&selected));
    }

    #[test]
    fn test_json_output_shape() {
        let notice = Notice::new("Time's up!", Severity::Warning);
        let line = serde_json::to_string(&Output::Notice(&notice)).unwrap();
        assert_eq!(
            line,
            r#"{"notice":{"message":"Time's up!","severity":"Warning"}}"#
        );
    }
}
