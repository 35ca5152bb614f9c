use kubeguard_types::{ControlResult, ControlStatus, KubeguardData, Verdict};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pass: u32,
    pub fail: u32,
    pub error: u32,
}

impl StatusCounts {
    pub fn from_results(results: &[ControlResult]) -> Self {
        let mut counts = StatusCounts::default();
        for r in results {
            match r.status {
                ControlStatus::Pass => counts.pass += 1,
                ControlStatus::Fail => counts.fail += 1,
                ControlStatus::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Clone, Debug)]
pub struct DomainReport {
    pub verdict: Verdict,
    pub results: Vec<ControlResult>,
    pub data: KubeguardData,
    pub counts: StatusCounts,
}
