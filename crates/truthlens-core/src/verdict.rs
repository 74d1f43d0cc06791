//! Verdict presentation lookup
//!
//! [`classify`] maps a [`VerdictCode`] to the descriptor every adapter renders.
//! Unknown codes fail open to the demo-mode descriptor.

use serde::Serialize;

use crate::types::VerdictCode;

/// How a verdict is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerdictDescriptor {
    pub emoji: &'static str,
    /// Accent color (hex).
    pub color: &'static str,
    pub label: &'static str,
    /// Light card background matching `color` (hex).
    pub background: &'static str,
}

const AUTHENTIC: VerdictDescriptor = VerdictDescriptor {
    emoji: "✅",
    color: "#27ae60",
    label: "Authentic Video",
    background: "#eafaf1",
};

const FAKE: VerdictDescriptor = VerdictDescriptor {
    emoji: "❌",
    color: "#e74c3c",
    label: "Deepfake Detected",
    background: "#fdedec",
};

const SUSPICIOUS: VerdictDescriptor = VerdictDescriptor {
    emoji: "⚠️",
    color: "#f39c12",
    label: "Suspicious",
    background: "#fef9e7",
};

const NO_FACES: VerdictDescriptor = VerdictDescriptor {
    emoji: "👤",
    color: "#95a5a6",
    label: "No Faces Found",
    background: "#f2f3f4",
};

const DEMO_MODE: VerdictDescriptor = VerdictDescriptor {
    emoji: "🔧",
    color: "#3498db",
    label: "Demo Mode",
    background: "#eaf4fc",
};

/// Map a verdict to its descriptor. Never fails.
pub fn classify(verdict: &VerdictCode) -> VerdictDescriptor {
    match verdict {
        VerdictCode::Authentic => AUTHENTIC,
        VerdictCode::Fake => FAKE,
        VerdictCode::Suspicious => SUSPICIOUS,
        VerdictCode::NoFaces => NO_FACES,
        VerdictCode::DemoMode => DEMO_MODE,
        VerdictCode::Unknown(code) => {
            tracing::debug!("Unknown verdict '{}', presenting as demo mode", code);
            DEMO_MODE
        }
    }
}
