//! The seam to the external trend model.
//!
//! A [`Predictor`] receives an algorithm name and the absolute path of a
//! symbol's data file and hands back whatever the model printed. It does not
//! interpret the output; decoding belongs to the bridge.

use crate::{
    error::{Result, StockError},
    models::Algorithm,
    utils::Logger,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tokio::process::Command;

/// Everything a finished predictor run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictorOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl PredictorOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait Predictor: Send + Sync {
    /// Run the model once over `data_file` and collect its output in full.
    async fn run(&self, algorithm: &Algorithm, data_file: &Path) -> Result<PredictorOutput>;

    fn name(&self) -> &str;
}

/// Spawns `<interpreter> <script> <algorithm> <data_file>` once per call.
/// With an empty interpreter the script itself is executed.
#[derive(Debug, Clone)]
pub struct ProcessPredictor {
    interpreter: String,
    script: PathBuf,
    logger: Logger,
}

impl ProcessPredictor {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            logger: Logger::new("PREDICTOR"),
        }
    }

    fn command(&self, algorithm: &Algorithm, data_file: &Path) -> Command {
        let mut cmd = if self.interpreter.trim().is_empty() {
            Command::new(&self.script)
        } else {
            let mut cmd = Command::new(&self.interpreter);
            cmd.arg(&self.script);
            cmd
        };
        cmd.arg(algorithm.as_str())
            .arg(data_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A caller that gives up (timeout, dropped request) takes the child down with it
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Predictor for ProcessPredictor {
    async fn run(&self, algorithm: &Algorithm, data_file: &Path) -> Result<PredictorOutput> {
        self.logger.debug(&format!(
            "Spawning {} {} {} {}",
            self.interpreter,
            self.script.display(),
            algorithm,
            data_file.display()
        ));

        let child = self.command(algorithm, data_file).spawn().map_err(|e| {
            StockError::Bridge(format!(
                "failed to start predictor {}: {}",
                self.script.display(),
                e
            ))
        })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StockError::Bridge(format!("failed to collect predictor output: {e}")))?;

        Ok(PredictorOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// Deterministic stand-in for the external model. Answers from a table
/// keyed by algorithm name and records every call.
#[derive(Debug, Default)]
pub struct InMemoryPredictor {
    default_output: PredictorOutput,
    outputs: HashMap<String, PredictorOutput>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Algorithm, PathBuf)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryPredictor {
    /// Every algorithm gets `stdout`
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            default_output: PredictorOutput::from_stdout(stdout),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, algorithm: &str, output: PredictorOutput) -> Self {
        self.outputs.insert(algorithm.to_string(), output);
        self
    }

    pub fn with_stdout(self, algorithm: &str, stdout: impl Into<String>) -> Self {
        self.with_output(algorithm, PredictorOutput::from_stdout(stdout))
    }

    /// Hold each run for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(Algorithm, PathBuf)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of runs observed at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predictor for InMemoryPredictor {
    async fn run(&self, algorithm: &Algorithm, data_file: &Path) -> Result<PredictorOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((algorithm.clone(), data_file.to_path_buf()));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(self
            .outputs
            .get(algorithm.as_str())
            .unwrap_or(&self.default_output)
            .clone())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
