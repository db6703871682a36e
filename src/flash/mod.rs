//! Flash orchestration
//!
//! Drives the optional mode-change step and the flash step through an
//! explicit state machine. A failed mode change aborts before any flash
//! command is issued; preview mode walks the same states without spawning
//! anything.

mod runner;

pub use runner::{CommandLine, ProcessRunner, ToolRunner};

use std::fmt;
use std::path::Path;

use crate::config;
use crate::error::{Error, Result, ToolStep};
use crate::{log_debug, log_error, log_info};

const MODULE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashState {
    Idle,
    ModeChangePending,
    ModeChangeDone,
    Flashing,
    Complete,
    /// Preview finished; nothing was executed
    Previewed,
    Aborted,
}

impl FlashState {
    pub fn can_transition_to(self, next: FlashState) -> bool {
        use FlashState::*;
        matches!(
            (self, next),
            (Idle, ModeChangePending)
                | (Idle, Flashing)
                | (ModeChangePending, ModeChangeDone)
                | (ModeChangePending, Aborted)
                | (ModeChangeDone, Flashing)
                | (Flashing, Complete)
                | (Flashing, Previewed)
                | (Flashing, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FlashState::Complete | FlashState::Previewed | FlashState::Aborted
        )
    }
}

impl fmt::Display for FlashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything the orchestrator needs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashPlan {
    pub port: String,
    pub change_mode_command: Option<CommandLine>,
    pub flash_command: CommandLine,
    pub dry_run: bool,
}

impl FlashPlan {
    /// Build the script invocations for `image` on `port`
    pub fn new(script: &Path, image: &Path, port: &str, change_mode: bool, dry_run: bool) -> Self {
        let base = CommandLine::new(script)
            .arg("-p")
            .arg(port)
            .arg("-f")
            .arg(image.to_string_lossy())
            .env(config::firmware::PORT_ENV, port);

        Self {
            port: port.to_string(),
            change_mode_command: change_mode.then(|| base.clone().arg("--change-mode")),
            flash_command: base,
            dry_run,
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashReport {
    pub final_state: FlashState,
    /// Commands executed, or in preview mode the commands that would run
    pub commands: Vec<CommandLine>,
    pub previewed: bool,
}

pub struct FlashOrchestrator<R> {
    runner: R,
    state: FlashState,
    history: Vec<FlashState>,
    echo: bool,
}

impl<R: ToolRunner> FlashOrchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            state: FlashState::Idle,
            history: vec![FlashState::Idle],
            echo: false,
        }
    }

    /// Print each command before running it (always on in preview mode)
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn state(&self) -> FlashState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`
    pub fn history(&self) -> &[FlashState] {
        &self.history
    }

    fn transition(&mut self, next: FlashState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::Configuration(format!(
                "invalid flash state transition {} -> {}",
                self.state, next
            )));
        }
        log_debug!(MODULE, "State {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Run (or preview) the plan. A plan is consumed exactly once.
    pub fn execute(&mut self, plan: FlashPlan) -> Result<FlashReport> {
        if self.state.is_terminal() {
            return Err(Error::Configuration(format!(
                "flash orchestrator already used (state {})",
                self.state
            )));
        }

        let mut issued = Vec::new();

        match &plan.change_mode_command {
            Some(command) => {
                self.transition(FlashState::ModeChangePending)?;
                log_info!(MODULE, "Step 1/2: Preparing flash (change mode)...");
                self.invoke(ToolStep::ModeChange, command, plan.dry_run)?;
                issued.push(command.clone());
                self.transition(FlashState::ModeChangeDone)?;
            }
            None => log_debug!(MODULE, "Skipping change-mode step (not requested)"),
        }

        self.transition(FlashState::Flashing)?;
        log_info!(MODULE, "Step 2/2: Flashing firmware on {}...", plan.port);
        self.invoke(ToolStep::Flash, &plan.flash_command, plan.dry_run)?;
        issued.push(plan.flash_command.clone());

        let done = if plan.dry_run {
            FlashState::Previewed
        } else {
            FlashState::Complete
        };
        self.transition(done)?;

        Ok(FlashReport {
            final_state: done,
            commands: issued,
            previewed: plan.dry_run,
        })
    }

    /// Launch one step; any failure moves the machine to `Aborted`
    fn invoke(&mut self, step: ToolStep, command: &CommandLine, dry_run: bool) -> Result<()> {
        if dry_run || self.echo {
            println!("+ {}", command);
        }
        if dry_run {
            log_info!(MODULE, "Dry run: not executing {}", step);
            return Ok(());
        }

        let failure = match self.runner.run(command) {
            Ok(Some(0)) => return Ok(()),
            Ok(Some(code)) => Error::ExternalTool {
                step,
                code: Some(code),
                reason: format!("exit code {}", code),
            },
            Ok(None) => Error::ExternalTool {
                step,
                code: None,
                reason: "terminated by signal".to_string(),
            },
            Err(e) => Error::ExternalTool {
                step,
                code: None,
                reason: format!("failed to launch {}: {}", command.program.display(), e),
            },
        };

        log_error!(MODULE, "{}. Aborting.", failure);
        self.transition(FlashState::Aborted)?;
        Err(failure)
    }
}
