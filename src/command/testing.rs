use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::{CommandOutput, CommandRequest, Runner};
use crate::errors::Error;

/// Records every request and answers from scripted rules.
///
/// A rule matches when its pattern is a substring of the rendered command line; the
/// first matching rule wins and unmatched commands succeed with empty output.
/// Files passed with `-f <path>` are read at call time so tests can inspect
/// temporary files that are deleted afterwards.
#[derive(Default)]
pub struct FakeRunner {
    rules: Mutex<Vec<(String, CommandOutput)>>,
    calls: Mutex<Vec<CommandRequest>>,
    submitted: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, pattern: &str, stdout: &str) {
        self.rules.lock().unwrap().push((
            pattern.into(),
            CommandOutput {
                stdout: stdout.into(),
                stderr: String::new(),
                code: Some(0),
            },
        ));
    }

    pub fn fail(&self, pattern: &str) {
        self.rules.lock().unwrap().push((
            pattern.into(),
            CommandOutput {
                stdout: String::new(),
                stderr: format!("{pattern}: failed"),
                code: Some(1),
            },
        ));
    }

    pub fn calls(&self) -> Vec<CommandRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, Error> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(position) = request.args.iter().position(|arg| arg == "-f") {
            if let Some(path) = request.args.get(position + 1) {
                if let Ok(content) = fs::read_to_string(path) {
                    self.submitted.lock().unwrap().push(content);
                }
            }
        }

        let line = request.to_string();
        let output = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                code: Some(0),
            });
        Ok(output)
    }
}
