use serde::{Deserialize, Serialize};

/// Hard resource ceilings applied to every sandboxed invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeLimits {
    /// Wall-clock limit per test case, in milliseconds.
    pub time_limit_ms: u64,
    /// Memory ceiling for the sandbox, in megabytes.
    pub memory_limit_mb: u32,
    /// CPU quota for the sandbox (1.0 = one full core).
    pub cpu_limit: f32,
    /// Largest submission the engine will accept, in bytes.
    pub max_source_bytes: usize,
}

impl Default for JudgeLimits {
    fn default() -> Self {
        Self {
            time_limit_ms: 5_000,
            memory_limit_mb: 256,
            cpu_limit: 0.5,
            max_source_bytes: 1024 * 1024,
        }
    }
}

/// Tolerance policy for floating-point comparison.
///
/// Two floats match when their difference is within `absolute`, or within
/// `relative` scaled by the larger magnitude. Integers and every other value
/// shape are compared exactly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloatTolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for FloatTolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-6,
            relative: 1e-9,
        }
    }
}

impl FloatTolerance {
    /// Exact comparison - both bounds zero.
    pub fn exact() -> Self {
        Self {
            absolute: 0.0,
            relative: 0.0,
        }
    }

    pub fn within(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let diff = (a - b).abs();
        diff <= self.absolute || diff <= self.relative * a.abs().max(b.abs())
    }
}
