use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, Reporter};
use crate::protocols::checksum;
use crate::protocols::group::{DataGroup, layout, parse_group};
use crate::protocols::value::{TypedValue, try_type_value};
use crate::protocols::variant::ProtocolVariant;

use super::frame::FrameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No start-of-frame byte seen yet; lines are discarded.
    Seeking,
    /// Groups are accumulated into the frame in progress.
    InFrame,
}

/// Frame state machine for one serial stream.
///
/// Once locked onto a frame boundary the assembler never goes back to
/// `Seeking` on its own: every end-of-frame byte emits the accumulated frame
/// and starts a new one. Callers wanting to resynchronize call [`reset`].
///
/// [`reset`]: FrameAssembler::reset
#[derive(Debug)]
pub struct FrameAssembler {
    variant: ProtocolVariant,
    state: AssemblerState,
    frame: FrameRecord,
}

impl FrameAssembler {
    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            variant,
            state: AssemblerState::Seeking,
            frame: FrameRecord::new(),
        }
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// The frame in progress, if any group or checksum failure was recorded.
    pub fn partial_frame(&self) -> Option<&FrameRecord> {
        if self.frame.is_empty() {
            None
        } else {
            Some(&self.frame)
        }
    }

    /// Drop the frame in progress and wait for the next start-of-frame byte.
    pub fn reset(&mut self) {
        self.state = AssemblerState::Seeking;
        self.frame = FrameRecord::new();
    }

    /// Feed one raw line; returns the completed frame when the line carries
    /// the end-of-frame byte.
    pub fn push_line<R: Reporter + ?Sized>(
        &mut self,
        line: &[u8],
        reporter: &mut R,
    ) -> Option<FrameRecord> {
        if self.state == AssemblerState::Seeking {
            // The boundary line itself carries no usable group.
            if line.contains(&layout::START_OF_FRAME) {
                info!(variant = %self.variant, "start of frame found");
                self.state = AssemblerState::InFrame;
            }
            return None;
        }

        let text = String::from_utf8_lossy(line);
        self.absorb(&text, reporter);

        if line.contains(&layout::END_OF_FRAME) {
            debug!(groups = self.frame.len(), "end of frame");
            return Some(std::mem::take(&mut self.frame));
        }
        None
    }

    fn absorb<R: Reporter + ?Sized>(&mut self, text: &str, reporter: &mut R) {
        let group = match parse_group(text, self.variant) {
            Ok(Some(group)) => group,
            Ok(None) => return,
            Err(err) => {
                let line = text.trim_end_matches(&layout::FRAMING_CHARS[..]);
                debug!(line = ?line, error = %err, "skipping malformed group");
                reporter.report(&Diagnostic::MalformedGroup {
                    line: line.to_string(),
                    reason: err.to_string(),
                });
                return;
            }
        };

        self.check(&group, reporter);

        let value = match try_type_value(&group.label, &group.value, self.variant) {
            Ok(value) => value,
            Err(err) => {
                warn!(label = %group.label, value = ?group.value, "{err}");
                reporter.report(&Diagnostic::TypeConversionFailure {
                    label: group.label.clone(),
                    value: group.value.clone(),
                });
                TypedValue::Integer(0)
            }
        };
        self.frame.insert(group.label, value);
    }

    fn check<R: Reporter + ?Sized>(&mut self, group: &DataGroup, reporter: &mut R) {
        let data = self.variant.checksum_data(group);
        let expected = checksum::compute(&data);
        if expected == group.checksum {
            self.frame.clear_checksum_failure(&group.label);
            return;
        }
        warn!(
            label = %group.label,
            expected = ?expected,
            found = ?group.checksum,
            "checksum mismatch"
        );
        reporter.report(&Diagnostic::ChecksumMismatch {
            label: group.label.clone(),
            expected,
            found: group.checksum,
        });
        if !self.variant.is_checksum_exempt(&group.label) {
            self.frame.record_checksum_failure(group.label.clone());
        }
    }
}
