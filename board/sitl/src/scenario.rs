use driver::sim::SimAdxl345;

/// 1 g at 4 mg/LSB
const ONE_G_LSB: i16 = 250;

/// Cycle at which the board gets shaken
const SHAKE_CYCLE: u32 = 10;
/// Cycle at which the board is dropped
const DROP_CYCLE: u32 = 15;

/// What happens to the board during one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    Rest,
    Tap,
    DoubleTap,
    Shake,
    FreeFall,
}

/// Raw sample and stimulus for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub sample: [i16; 3],
    pub stimulus: Stimulus,
}

impl Step {
    /// Drive the simulated chip with this step
    pub fn apply(&self, sim: &mut SimAdxl345) {
        sim.set_sample(self.sample);
        match self.stimulus {
            Stimulus::Rest => {}
            Stimulus::Tap => sim.tap(),
            Stimulus::DoubleTap => sim.double_tap(),
            Stimulus::Shake => sim.shake(),
            Stimulus::FreeFall => sim.free_fall(),
        }
    }
}

/// Scripted motion of a board lying flat on a desk
pub struct Scenario {
    cycle: u32,
    tap_every: u32,
    double_tap: bool,
}

impl Scenario {
    pub fn new(tap_every: u32, double_tap: bool) -> Self {
        Self {
            cycle: 0,
            tap_every: tap_every.max(1),
            double_tap,
        }
    }

    /// Advance one cycle
    pub fn step(&mut self) -> Step {
        let cycle = self.cycle;
        self.cycle = self.cycle.wrapping_add(1);

        // Small deterministic wobble around gravity on +Z
        let wobble = (cycle.wrapping_mul(7) % 5) as i16 - 2;
        let mut sample = [wobble, -wobble, ONE_G_LSB + wobble];

        let stimulus = if cycle == SHAKE_CYCLE {
            sample[0] += 3 * ONE_G_LSB;
            Stimulus::Shake
        } else if cycle == DROP_CYCLE {
            sample = [wobble, wobble, wobble];
            Stimulus::FreeFall
        } else if cycle % self.tap_every == self.tap_every - 1 {
            if self.double_tap {
                Stimulus::DoubleTap
            } else {
                Stimulus::Tap
            }
        } else {
            Stimulus::Rest
        };

        Step { sample, stimulus }
    }
}
