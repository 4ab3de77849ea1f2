// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use crate::crash_info::{default_signals, TrackedSignal};
use crate::shared::constants::*;
use crate::shared::error::CrashtrackerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stacktrace collection occurs in the context of a crashing process.
/// If the stack is sufficiently corrupted, it is possible (but unlikely),
/// for stack trace collection itself to crash.
/// We recommend fully enabling stacktrace collection, but having an environment
/// variable to allow downgrading the collector.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StacktraceCollection {
    /// Only the header and the "Stack trace:" marker are emitted.
    Disabled,
    /// One raw instruction pointer per frame.
    WithoutSymbols,
    /// This option uses `backtrace::resolve_unsynchronized()` to gather symbol information.
    /// Symbol resolution is not async-signal-safe; frames that fail to resolve fall back to
    /// their raw address.
    #[default]
    EnabledWithInprocessSymbols,
}

impl std::str::FromStr for StacktraceCollection {
    type Err = CrashtrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "without_symbols" => Ok(Self::WithoutSymbols),
            "in_process" | "enabled_with_inprocess_symbols" => {
                Ok(Self::EnabledWithInprocessSymbols)
            }
            other => Err(CrashtrackerError::InvalidConfig(format!(
                "unknown stacktrace collection mode {other:?}"
            ))),
        }
    }
}

/// Where the crash report goes.
///
/// The sink is opened when the handlers are configured, never from inside the
/// signal handler, which only issues `write(2)` on the already-open descriptor.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashSink {
    #[default]
    Stderr,
    /// Appended to, created if missing.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashtrackerConfiguration {
    create_alt_stack: bool,
    max_frames: usize,
    resolve_frames: StacktraceCollection,
    signals: Vec<TrackedSignal>,
    sink: CrashSink,
    use_alt_stack: bool,
}

impl Default for CrashtrackerConfiguration {
    fn default() -> Self {
        Self {
            create_alt_stack: false,
            max_frames: MITE_CRASHTRACK_MAX_FRAMES,
            resolve_frames: StacktraceCollection::default(),
            signals: default_signals(),
            sink: CrashSink::default(),
            use_alt_stack: false,
        }
    }
}

impl CrashtrackerConfiguration {
    pub fn new(
        create_alt_stack: bool,
        use_alt_stack: bool,
        max_frames: usize,
        resolve_frames: StacktraceCollection,
        signals: Vec<TrackedSignal>,
        sink: CrashSink,
    ) -> Result<Self, CrashtrackerError> {
        let config = Self {
            create_alt_stack,
            max_frames,
            resolve_frames,
            signals,
            sink,
            use_alt_stack,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, CrashtrackerError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CrashtrackerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The default configuration, with the `MITE_CRASHTRACK_*` environment
    /// overrides applied.
    pub fn from_env() -> Result<Self, CrashtrackerError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CrashtrackerError> {
        if let Some(max_frames) = lookup(MITE_CRASHTRACK_MAX_FRAMES_ENV) {
            self.max_frames = max_frames.trim().parse().map_err(|e| {
                CrashtrackerError::InvalidConfig(format!(
                    "{MITE_CRASHTRACK_MAX_FRAMES_ENV}={max_frames:?}: {e}"
                ))
            })?;
        }
        if let Some(resolve_frames) = lookup(MITE_CRASHTRACK_RESOLVE_FRAMES_ENV) {
            self.resolve_frames = resolve_frames.parse()?;
        }
        let output = lookup(MITE_CRASHTRACK_OUTPUT_ENV).unwrap_or_default();
        if !output.is_empty() {
            self.sink = CrashSink::File(output.into());
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CrashtrackerError> {
        // Requesting to create, but not use, the altstack is considered paradoxical.
        if self.create_alt_stack && !self.use_alt_stack {
            return Err(CrashtrackerError::InvalidConfig(
                "Cannot create an altstack without using it".to_string(),
            ));
        }
        if !(1..=MITE_CRASHTRACK_MAX_FRAMES).contains(&self.max_frames) {
            return Err(CrashtrackerError::InvalidConfig(format!(
                "max_frames must be between 1 and {MITE_CRASHTRACK_MAX_FRAMES}, got {}",
                self.max_frames
            )));
        }
        // The registry order must match the saved handler table, so a signal may only
        // appear once.
        let mut seen = Vec::with_capacity(self.signals.len());
        for signal in &self.signals {
            if seen.contains(signal) {
                return Err(CrashtrackerError::InvalidConfig(format!(
                    "Signals contained duplicate element {signal:?}"
                )));
            }
            seen.push(*signal);
        }
        Ok(())
    }

    pub fn create_alt_stack(&self) -> bool {
        self.create_alt_stack
    }

    pub fn use_alt_stack(&self) -> bool {
        self.use_alt_stack
    }

    /// Upper bound on the frames in a report, counted from the innermost one.
    /// The crash handler's own frames come first and count towards it, so a
    /// small cap may leave no room for the frames of the code that crashed.
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn resolve_frames(&self) -> StacktraceCollection {
        self.resolve_frames
    }

    pub fn signals(&self) -> &[TrackedSignal] {
        &self.signals
    }

    pub fn sink(&self) -> &CrashSink {
        &self.sink
    }

    pub fn set_create_alt_stack(
        &mut self,
        create_alt_stack: bool,
    ) -> Result<(), CrashtrackerError> {
        if create_alt_stack && !self.use_alt_stack {
            return Err(CrashtrackerError::InvalidConfig(
                "Cannot create an altstack without using it".to_string(),
            ));
        }
        self.create_alt_stack = create_alt_stack;
        Ok(())
    }

    pub fn set_use_alt_stack(&mut self, use_alt_stack: bool) -> Result<(), CrashtrackerError> {
        if self.create_alt_stack && !use_alt_stack {
            return Err(CrashtrackerError::InvalidConfig(
                "Cannot create an altstack without using it".to_string(),
            ));
        }
        self.use_alt_stack = use_alt_stack;
        Ok(())
    }

    pub fn set_sink(&mut self, sink: CrashSink) {
        self.sink = sink;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CrashtrackerConfiguration::default();
        assert_eq!(config.signals(), default_signals().as_slice());
        assert_eq!(config.max_frames(), 128);
        assert_eq!(
            config.resolve_frames(),
            StacktraceCollection::EnabledWithInprocessSymbols
        );
        assert_eq!(config.sink(), &CrashSink::Stderr);
        assert!(!config.create_alt_stack());
        assert!(!config.use_alt_stack());
    }

    #[test]
    fn test_config_new_rejects_invalid() {
        let err = CrashtrackerConfiguration::new(
            true,
            false,
            128,
            StacktraceCollection::WithoutSymbols,
            default_signals(),
            CrashSink::Stderr,
        )
        .unwrap_err();
        assert!(err.to_string().contains("altstack"), "got {err}");

        for max_frames in [0, 129] {
            CrashtrackerConfiguration::new(
                false,
                false,
                max_frames,
                StacktraceCollection::WithoutSymbols,
                default_signals(),
                CrashSink::Stderr,
            )
            .unwrap_err();
        }

        let err = CrashtrackerConfiguration::new(
            false,
            false,
            16,
            StacktraceCollection::WithoutSymbols,
            vec![TrackedSignal::SIGSEGV, TrackedSignal::SIGBUS, TrackedSignal::SIGSEGV],
            CrashSink::Stderr,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"), "got {err}");
    }

    #[test]
    fn test_config_allows_no_signals() {
        let config = CrashtrackerConfiguration::new(
            false,
            false,
            1,
            StacktraceCollection::Disabled,
            vec![],
            CrashSink::Stderr,
        )
        .unwrap();
        assert!(config.signals().is_empty());
    }

    #[test]
    fn test_alt_stack_setters() {
        let mut config = CrashtrackerConfiguration::default();
        config.set_create_alt_stack(true).unwrap_err();
        config.set_use_alt_stack(true).unwrap();
        config.set_create_alt_stack(true).unwrap();
        config.set_use_alt_stack(false).unwrap_err();
        assert!(config.create_alt_stack());
        assert!(config.use_alt_stack());
    }

    #[test]
    fn test_from_json() {
        let config = CrashtrackerConfiguration::from_json(
            r#"{
                "max_frames": 32,
                "resolve_frames": "without_symbols",
                "signals": ["SIGSEGV", "SIGABRT"],
                "sink": {"file": "/tmp/mite-crash.log"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_frames(), 32);
        assert_eq!(
            config.resolve_frames(),
            StacktraceCollection::WithoutSymbols
        );
        assert_eq!(
            config.signals(),
            &[TrackedSignal::SIGSEGV, TrackedSignal::SIGABRT]
        );
        assert_eq!(
            config.sink(),
            &CrashSink::File(PathBuf::from("/tmp/mite-crash.log"))
        );

        let config = CrashtrackerConfiguration::from_json("{}").unwrap();
        assert_eq!(config, CrashtrackerConfiguration::default());

        for bad in [
            r#"{"max_frames": 0}"#,
            r#"{"signals": ["SIGKILL"]}"#,
            "not json",
        ] {
            CrashtrackerConfiguration::from_json(bad).unwrap_err();
        }
    }

    fn only_var(name: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |key| (key == name).then(|| value.to_string())
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (MITE_CRASHTRACK_MAX_FRAMES_ENV, " 12 "),
            (MITE_CRASHTRACK_RESOLVE_FRAMES_ENV, "Disabled"),
            (MITE_CRASHTRACK_OUTPUT_ENV, "/var/tmp/crash.txt"),
        ]
        .into_iter()
        .collect();
        let config = CrashtrackerConfiguration::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_frames(), 12);
        assert_eq!(config.resolve_frames(), StacktraceCollection::Disabled);
        assert_eq!(
            config.sink(),
            &CrashSink::File(PathBuf::from("/var/tmp/crash.txt"))
        );

        let config = CrashtrackerConfiguration::default()
            .with_overrides(only_var(MITE_CRASHTRACK_OUTPUT_ENV, ""))
            .unwrap();
        assert_eq!(config.sink(), &CrashSink::Stderr);

        CrashtrackerConfiguration::default()
            .with_overrides(only_var(MITE_CRASHTRACK_MAX_FRAMES_ENV, "lots"))
            .unwrap_err();
        CrashtrackerConfiguration::default()
            .with_overrides(only_var(MITE_CRASHTRACK_RESOLVE_FRAMES_ENV, "always"))
            .unwrap_err();
    }
}
