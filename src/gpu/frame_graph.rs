//! Stage sequence of one frame.
//!
//! Scene, then `N` blur iterations alternating between two ping-pong
//! targets, then composite. The blur starts writing target 1 with the
//! horizontal kernel and flips target and direction every iteration; each
//! iteration reads the bright-pass attachment first and the other target
//! afterwards. The composite therefore reads target 1 after an odd count and
//! target 0 after an even count. With no iterations target 0 is only
//! cleared, so the frame carries no bloom.

/// Texture the next stage samples as bloom input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomSource {
    /// Bright-pass attachment of the scene target.
    Bright,
    /// Ping-pong blur target at this index.
    Ping(usize),
}

/// One blur iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurStep {
    pub iteration: u32,
    /// Ping-pong target written by this step.
    pub target: usize,
    pub source: BloomSource,
    pub horizontal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Scene,
    Blur(BlurStep),
    /// Additive composite reading the ping-pong target at `bloom`.
    Composite { bloom: usize },
}

/// Iterate the blur steps of a frame with `iterations` passes.
pub fn blur_steps(iterations: u32) -> impl Iterator<Item = BlurStep> {
    (0..iterations).map(|iteration| {
        // iteration 0 is horizontal and writes target 1
        let horizontal = iteration % 2 == 0;
        let target = horizontal as usize;
        let source = if iteration == 0 {
            BloomSource::Bright
        } else {
            BloomSource::Ping(1 - target)
        };
        BlurStep {
            iteration,
            target,
            source,
            horizontal,
        }
    })
}

/// Ping-pong target holding the finished bloom after `iterations` passes.
pub fn final_blur_target(iterations: u32) -> usize {
    (iterations % 2) as usize
}

/// Precomputed stage list, rebuilt only when the blur count changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    blur_iterations: u32,
    stages: Vec<FrameStage>,
}

impl FramePlan {
    pub fn new(blur_iterations: u32) -> Self {
        let mut stages = Vec::with_capacity(blur_iterations as usize + 2);
        stages.push(FrameStage::Scene);
        stages.extend(blur_steps(blur_iterations).map(FrameStage::Blur));
        stages.push(FrameStage::Composite {
            bloom: final_blur_target(blur_iterations),
        });
        Self {
            blur_iterations,
            stages,
        }
    }

    pub fn blur_iterations(&self) -> u32 {
        self.blur_iterations
    }

    pub fn stages(&self) -> &[FrameStage] {
        &self.stages
    }

    pub fn blur_steps(&self) -> impl Iterator<Item = &BlurStep> {
        self.stages.iter().filter_map(|stage| match stage {
            FrameStage::Blur(step) => Some(step),
            _ => None,
        })
    }
}

impl Default for FramePlan {
    fn default() -> Self {
        Self::new(super::renderer::DEFAULT_BLUR_ITERATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_reads_bright_pass() {
        let steps: Vec<_> = blur_steps(3).collect();
        assert_eq!(
            steps,
            vec![
                BlurStep {
                    iteration: 0,
                    target: 1,
                    source: BloomSource::Bright,
                    horizontal: true
                },
                BlurStep {
                    iteration: 1,
                    target: 0,
                    source: BloomSource::Ping(1),
                    horizontal: false
                },
                BlurStep {
                    iteration: 2,
                    target: 1,
                    source: BloomSource::Ping(0),
                    horizontal: true
                },
            ]
        );
    }

    #[test]
    fn test_final_target_follows_parity() {
        assert_eq!(final_blur_target(0), 0);
        assert_eq!(final_blur_target(1), 1);
        assert_eq!(final_blur_target(2), 0);
        assert_eq!(final_blur_target(10), 0);
        assert_eq!(final_blur_target(11), 1);
    }

    #[test]
    fn test_final_target_is_last_written_target() {
        for n in 1..12 {
            let last = blur_steps(n).last().unwrap();
            assert_eq!(final_blur_target(n), last.target);
        }
    }

    #[test]
    fn test_steps_never_read_their_own_target() {
        for step in blur_steps(10) {
            assert_ne!(step.source, BloomSource::Ping(step.target));
            assert_eq!(step.horizontal, step.target == 1);
        }
    }

    #[test]
    fn test_plan_is_linear() {
        let plan = FramePlan::default();
        assert_eq!(plan.blur_iterations(), 10);
        assert_eq!(plan.stages().len(), 12);
        assert_eq!(plan.stages()[0], FrameStage::Scene);
        assert_eq!(
            plan.stages()[11],
            FrameStage::Composite { bloom: 0 }
        );
        assert_eq!(plan.blur_steps().count(), 10);
    }

    #[test]
    fn test_plan_without_blur_never_reads_bright_pass() {
        // zero is even: the composite reads target 0, never the bright pass
        let plan = FramePlan::new(0);
        assert_eq!(
            plan.stages(),
            &[FrameStage::Scene, FrameStage::Composite { bloom: 0 }]
        );
        assert_eq!(plan.blur_steps().count(), 0);
    }
}
