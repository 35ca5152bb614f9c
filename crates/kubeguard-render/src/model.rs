#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableStatus {
    Pass,
    Fail,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableViolation {
    pub identifier: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableControl {
    pub control_id: String,
    pub title: String,
    pub severity: String,
    pub status: RenderableStatus,
    pub message: String,
    pub remediation: Option<String>,
    pub violations: Vec<RenderableViolation>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    pub profile: String,
    pub controls_total: u32,
    pub controls_passed: u32,
    pub controls_failed: u32,
    pub controls_errored: u32,
    pub violations_total: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub controls: Vec<RenderableControl>,
    pub data: RenderableData,
}
