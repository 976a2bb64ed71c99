#![allow(dead_code)]

use grafana_ops::console::Prompter;
use grafana_ops::runner::{CommandOutput, CommandRunner, Invocation};
use grafana_ops::settings::Settings;
use grafana_ops::{ConsoleError, Result};
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

/// Ordered record of everything the code under test did: command lines and prompts.
pub type Journal = Rc<RefCell<Vec<String>>>;

struct Rule {
    pattern: String,
    replies: VecDeque<CommandOutput>,
    last: CommandOutput,
}

/// Command runner that answers from a script instead of spawning processes.
///
/// The first rule whose pattern is a substring of the command line answers. A
/// sequence rule pops replies in order and repeats its last one. Unmatched
/// commands succeed with empty output.
pub struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    journal: Journal,
    stdin: RefCell<Vec<String>>,
    pauses: RefCell<Vec<Duration>>,
    cancel_pauses: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: RefCell::new(Vec::new()),
            journal: Rc::new(RefCell::new(Vec::new())),
            stdin: RefCell::new(Vec::new()),
            pauses: RefCell::new(Vec::new()),
            cancel_pauses: false,
        }
    }

    /// Every pause reports an operator interrupt.
    pub fn cancelling_pauses(mut self) -> Self {
        self.cancel_pauses = true;
        self
    }

    pub fn on(&self, pattern: &str, output: CommandOutput) -> &Self {
        self.on_sequence(pattern, vec![output])
    }

    pub fn on_sequence(&self, pattern: &str, mut outputs: Vec<CommandOutput>) -> &Self {
        let last = outputs.pop().unwrap_or_default();
        self.rules.borrow_mut().push(Rule {
            pattern: pattern.to_string(),
            replies: outputs.into(),
            last,
        });
        self
    }

    pub fn journal(&self) -> Journal {
        Rc::clone(&self.journal)
    }

    pub fn calls(&self) -> Vec<String> {
        self.journal
            .borrow()
            .iter()
            .filter(|entry| !entry.starts_with("prompt:"))
            .cloned()
            .collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    /// Index of the first journal entry containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.journal.borrow().iter().position(|c| c.contains(pattern))
    }

    pub fn stdin_bodies(&self) -> Vec<String> {
        self.stdin.borrow().clone()
    }

    pub fn paused(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }

    fn answer(&self, invocation: &Invocation) -> CommandOutput {
        let line = invocation.command_line();
        self.journal.borrow_mut().push(line.clone());
        if let Some(body) = &invocation.stdin {
            self.stdin.borrow_mut().push(body.clone());
        }

        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|rule| line.contains(&rule.pattern)) {
            Some(rule) => rule.replies.pop_front().unwrap_or_else(|| rule.last.clone()),
            None => CommandOutput::success(""),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        Ok(self.answer(invocation))
    }

    fn run_attached(&self, invocation: &Invocation) -> Result<CommandOutput> {
        Ok(self.answer(invocation))
    }

    fn pause(&self, duration: Duration) -> Result<()> {
        self.pauses.borrow_mut().push(duration);
        if self.cancel_pauses {
            return Err(ConsoleError::Cancelled);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Answer {
    Choice(usize),
    Confirm(bool),
    Text(String),
}

/// Prompter that replays queued answers. Running out is `InputClosed`.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    journal: Journal,
}

impl ScriptedPrompter {
    pub fn new(journal: Journal, answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            journal,
        }
    }

    fn next(&self, kind: &str, message: &str) -> Result<Answer> {
        self.journal
            .borrow_mut()
            .push(format!("prompt: {} {}", kind, message));
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or(ConsoleError::InputClosed)
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&self, message: &str, max: usize) -> Result<usize> {
        match self.next("choose", message)? {
            Answer::Choice(n) if n <= max => Ok(n),
            other => panic!("unexpected answer {:?} for choice '{}'", other, message),
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        match self.next("confirm", message)? {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("unexpected answer {:?} for confirm '{}'", other, message),
        }
    }

    fn ask(&self, message: &str, default: Option<&str>) -> Result<String> {
        match self.next("ask", message)? {
            Answer::Text(text) if text.is_empty() => Ok(default.unwrap_or_default().to_string()),
            Answer::Text(text) => Ok(text),
            other => panic!("unexpected answer {:?} for ask '{}'", other, message),
        }
    }
}

/// Config directory holding the backup manifest, plus settings rooted at it.
pub fn test_settings() -> (Settings, TempDir) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("database")).unwrap();
    fs::write(
        dir.path().join("database/postgresql-backup.yaml"),
        "kind: CronJob\n",
    )
    .unwrap();

    let settings = Settings::from_lookup(dir.path(), |_| None).unwrap();
    (settings, dir)
}

pub fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::success(stdout)
}

pub fn fail(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput::failure(stderr)
}

pub fn not_found(kind: &str, name: &str) -> CommandOutput {
    fail(format!(
        "Error from server (NotFound): {} \"{}\" not found",
        kind, name
    ))
}

/// Pod list where Running pods also report Ready.
pub fn pod_list(pods: &[(&str, &str)]) -> CommandOutput {
    let items: Vec<_> = pods
        .iter()
        .map(|(name, phase)| pod_json(name, phase, *phase == "Running"))
        .collect();
    ok(json!({ "items": items }).to_string())
}

/// A single pod that is Running while its readiness check still fails.
pub fn unready_pod_list(name: &str) -> CommandOutput {
    ok(json!({ "items": [pod_json(name, "Running", false)] }).to_string())
}

fn pod_json(name: &str, phase: &str, ready: bool) -> serde_json::Value {
    let status = if ready { "True" } else { "False" };
    json!({
        "metadata": { "name": name },
        "status": { "phase": phase, "conditions": [{ "type": "Ready", "status": status }] }
    })
}

pub fn pod(phase: &str) -> CommandOutput {
    ok(json!({ "metadata": { "name": "pod" }, "status": { "phase": phase } }).to_string())
}

/// Job with the given condition set to True, or no conditions for `None`.
pub fn job(condition: Option<&str>) -> CommandOutput {
    let conditions: Vec<_> = condition
        .map(|kind| json!({ "type": kind, "status": "True" }))
        .into_iter()
        .collect();
    ok(json!({ "metadata": { "name": "job" }, "status": { "conditions": conditions } }).to_string())
}

/// Deployment reporting the Available condition as True.
pub fn available_deployment() -> CommandOutput {
    ok(json!({
        "metadata": { "name": "grafana-operator" },
        "spec": { "replicas": 1 },
        "status": {
            "replicas": 1,
            "readyReplicas": 1,
            "availableReplicas": 1,
            "conditions": [{ "type": "Available", "status": "True" }]
        }
    })
    .to_string())
}

pub fn deployment(desired: u32, ready: u32) -> CommandOutput {
    ok(json!({
        "metadata": { "name": "grafana-operator" },
        "spec": { "replicas": desired },
        "status": { "replicas": desired, "readyReplicas": ready, "availableReplicas": ready }
    })
    .to_string())
}
