//! Audible completion signals.
//!
//! On Windows the tones are played through the console beeper via
//! PowerShell. Elsewhere a terminal bell is written per tone group: two for
//! success, three for failure.

use std::time::Duration;

use jobwatch_core::ports::Outcome;

/// Upper bound on how long a chime may take before it is abandoned.
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// One beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration: Duration,
}

impl Tone {
    pub const fn new(frequency_hz: u32, duration_ms: u64) -> Self {
        Self {
            frequency_hz,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

/// A short sequence of tones separated by a fixed gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chime {
    pub tones: Vec<Tone>,
    pub gap: Duration,
}

impl Chime {
    /// Two short high beeps.
    pub fn success() -> Self {
        Self {
            tones: vec![Tone::new(1000, 250), Tone::new(1000, 250)],
            gap: Duration::from_millis(50),
        }
    }

    /// Three descending low beeps.
    pub fn failure() -> Self {
        Self {
            tones: vec![Tone::new(400, 300), Tone::new(350, 300), Tone::new(300, 300)],
            gap: Duration::from_millis(50),
        }
    }

    /// Timeouts sound like failures.
    pub fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => Self::success(),
            Outcome::Failed | Outcome::TimedOut => Self::failure(),
        }
    }

    /// PowerShell one-liner that plays the chime on the console beeper.
    pub fn powershell_script(&self) -> String {
        let gap_ms = self.gap.as_millis();
        self.tones
            .iter()
            .map(|t| format!("[console]::beep({},{})", t.frequency_hz, t.duration.as_millis()))
            .collect::<Vec<_>>()
            .join(&format!("; Start-Sleep -Milliseconds {gap_ms}; "))
    }

    /// Terminal bell characters standing in for the tones.
    pub fn bells(&self) -> String {
        "\x07".repeat(self.tones.len())
    }

    /// Play the chime. Failures are logged, never returned.
    pub async fn play(&self) {
        match tokio::time::timeout(PLAYBACK_TIMEOUT, self.play_native()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Chime playback failed"),
            Err(_) => tracing::debug!("Chime playback timed out"),
        }
    }

    #[cfg(windows)]
    async fn play_native(&self) -> std::io::Result<()> {
        let status = tokio::process::Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(self.powershell_script())
            .status()
            .await?;
        if !status.success() {
            tracing::debug!(code = status.code().unwrap_or(-1), "powershell beep exited with failure");
        }
        Ok(())
    }

    #[cfg(not(windows))]
    async fn play_native(&self) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut stderr = tokio::io::stderr();
        stderr.write_all(self.bells().as_bytes()).await?;
        stderr.flush().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
