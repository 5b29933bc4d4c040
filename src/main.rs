//! CaseForge terminal entry point.
//!
//! A thin interactive shell over the pipeline: it renders store and pipeline
//! state, dispatches controller operations on user intent, and prints
//! generated output through the content segmenter. Because the shell awaits
//! each operation before prompting again, triggers are naturally disabled
//! while the pipeline is busy.

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};

use caseforge::application::segmenter::ContentSegmenter;
use caseforge::commands;
use caseforge::domain::{Issue, IssueStatus, Segment};
use caseforge::infra::api::ApiClient;
use caseforge::infra::app_config;
use caseforge::state::{AppState, Stage};

#[derive(Parser, Debug)]
#[command(name = "caseforge")]
#[command(about = "AI-powered test case pipeline companion", long_about = None)]
struct Args {
    /// Base URL of the pipeline service (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = app_config::load_config();
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let state = AppState::new(config);
    let (client, segmenter) = {
        let config = state.config.read().unwrap();
        (
            ApiClient::new(&config.api_base_url),
            ContentSegmenter::with_languages(config.code_languages.clone()),
        )
    };

    println!("CaseForge - AI based test generator");
    println!("Type 'help' for commands, 'quit' to exit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        prompt(&state)?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let mut parts = line.trim().splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match command {
            "" => {}
            "help" => print_help(),
            "stage" => match rest.parse::<Stage>() {
                Ok(stage) => {
                    report(commands::set_active_stage(&state, &client, stage).await);
                    if stage != Stage::Generate {
                        print_issues(&state, "");
                    }
                }
                Err(err) => println!("{err}"),
            },
            "issues" => print_issues(&state, ""),
            "search" => print_issues(&state, rest),
            "select" => {
                let id = (!rest.is_empty()).then(|| rest.to_string());
                commands::select_issue(&state, id);
                print_active_issue(&state, &segmenter);
            }
            "check" => {
                if rest.is_empty() {
                    println!("Usage: check <key>");
                } else {
                    commands::toggle_selection(&state, rest);
                }
            }
            "analyze" => {
                let keys: Vec<String> = rest.split(',').map(|k| k.trim().to_string()).collect();
                report(commands::analyze(&state, &client, &keys).await);
                print_analysis(&state);
            }
            "cases" => {
                report(commands::generate_test_cases(&state, &client).await);
                let generated = state.pipeline.lock().unwrap().generated_test_cases.clone();
                if let Some(test_cases) = generated {
                    println!("Generated Test Cases:\n{test_cases}");
                }
            }
            "auto" => {
                let id = active_or_given(&state, rest);
                report(commands::generate_automated_code(&state, &client, &id).await);
                let generated = state.pipeline.lock().unwrap().generated_code.clone();
                if let Some(code) = generated {
                    println!("Generated Automated Code:");
                    print_segments(&segmenter, &code);
                }
            }
            "edit" => {
                let id = active_or_given(&state, rest);
                if id.is_empty() {
                    println!("No issue selected.");
                } else {
                    let text = read_block(&mut lines)?;
                    commands::edit_test_cases(&state, &id, text);
                    println!("Edit buffered for {id}; run 'update {id}' to persist.");
                }
            }
            "update" => {
                let id = active_or_given(&state, rest);
                if id.is_empty() {
                    println!("No issue selected.");
                } else if report(commands::update_test_cases(&state, &client, &id).await) {
                    println!("Test cases updated and verified.");
                }
            }
            "show" => print_active_issue(&state, &segmenter),
            "quit" | "exit" => break,
            other => println!("Unknown command '{other}'; type 'help'."),
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        "\
Commands:
  stage <generate|verify|automate>  switch stage (verify/automate fetch issues)
  issues                            list issues for the active stage
  search <text>                     filter issues by key or status
  select <id>                       set the active issue
  check <key>                       toggle an issue key in the selection
  analyze <id,id,...>               analyze issues by id
  cases                             generate test cases from the last analysis
  auto [id]                         generate automation code for an issue
  edit [id]                         enter replacement test cases ('.' to end)
  update [id]                       verify and persist the edited test cases
  show                              show the active issue
  quit                              exit"
    );
}

/// Status line rendered before every prompt: stage, busy marker, last error.
fn prompt(state: &AppState) -> Result<()> {
    let (stage, busy, error) = {
        let pipeline = state.pipeline.lock().unwrap();
        (
            pipeline.active_stage,
            pipeline.busy,
            pipeline.error.clone(),
        )
    };
    if let Some(error) = error {
        println!("Error: {error}");
    }
    let spinner = if busy { " [busy]" } else { "" };
    print!("[{stage}]{spinner}> ");
    io::stdout().flush()?;
    Ok(())
}

/// Prints the operation outcome; errors were already recorded in pipeline
/// state by the controller. Returns whether the operation succeeded.
fn report<T>(result: std::result::Result<T, caseforge::domain::PipelineError>) -> bool {
    if let Err(err) = &result {
        println!("Error: {err}");
    }
    result.is_ok()
}

fn active_or_given(state: &AppState, given: &str) -> String {
    if given.is_empty() {
        state
            .pipeline
            .lock()
            .unwrap()
            .active_issue
            .clone()
            .unwrap_or_default()
    } else {
        given.to_string()
    }
}

/// Reads an edit-buffer block from the shell, terminated by a lone '.'.
fn read_block(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<String> {
    println!("Enter test cases; finish with a single '.' line:");
    let mut block = String::new();
    for line in lines {
        let line = line?;
        if line.trim() == "." {
            break;
        }
        block.push_str(&line);
        block.push('\n');
    }
    Ok(block)
}

/// Lists issues for the active stage. The Automate stage only offers issues
/// that already have generated code or verified test cases; a non-empty
/// query narrows any listing by key or status.
fn print_issues(state: &AppState, query: &str) {
    let stage = state.pipeline.lock().unwrap().active_stage;
    let store = state.store.lock().unwrap();
    let listed: Vec<&Issue> = if query.is_empty() {
        store.filter(|_| true)
    } else {
        store.search(query)
    };
    let listed: Vec<&Issue> = match stage {
        Stage::Automate => listed
            .into_iter()
            .filter(|issue| {
                matches!(
                    issue.status,
                    IssueStatus::CodeGenerated | IssueStatus::TestCaseVerified
                )
            })
            .collect(),
        _ => listed,
    };

    if listed.is_empty() {
        println!("No issues to show; switch to verify/automate to fetch.");
        return;
    }
    for issue in listed {
        println!("  {}  {} : {}", issue.id, issue.key, issue.status);
    }
}

fn print_analysis(state: &AppState) {
    let pipeline = state.pipeline.lock().unwrap();
    let Some(analysis) = &pipeline.analysis else {
        return;
    };
    println!("Analysis Output:");
    for key in &pipeline.analysis_keys {
        match analysis.get(key) {
            Some(text) => {
                let marker = if pipeline.selection.contains(key) {
                    "[x]"
                } else {
                    "[ ]"
                };
                println!("{marker} {key}\n{text}\n");
            }
            None => println!("No analysis data available for {key}\n"),
        }
    }
}

fn print_active_issue(state: &AppState, segmenter: &ContentSegmenter) {
    let active = state.pipeline.lock().unwrap().active_issue.clone();
    let Some(id) = active else {
        println!("No issue selected.");
        return;
    };
    let store = state.store.lock().unwrap();
    let Some(issue) = store.find(&id) else {
        println!("Issue not found: {id}");
        return;
    };

    println!("{} : {}", issue.key, issue.status);
    if issue.test_cases.is_empty() {
        println!("No test cases available.");
    } else {
        println!("Test Cases:\n{}", issue.test_cases);
    }
    for artifact in &issue.artifacts {
        println!("== {} ==", artifact.title);
        print_segments(segmenter, &artifact.body);
    }
    if let Some(code) = &issue.automated_code {
        println!("Automated Code:");
        print_segments(segmenter, code);
    }
}

/// Renders mixed output: plain paragraphs as-is, fenced code labelled with
/// its language. Syntax highlighting is a rendering concern left to the
/// terminal; segments are printed verbatim.
fn print_segments(segmenter: &ContentSegmenter, text: &str) {
    for segment in segmenter.segment(text) {
        match segment {
            Segment::Text { content } => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    println!("{trimmed}");
                }
            }
            Segment::Code { language, content } => {
                println!("┌─ code ({language})");
                for line in content.trim_end_matches('\n').lines() {
                    println!("│ {line}");
                }
                println!("└─");
            }
        }
    }
}
