use crate::light::LightId;

/// Fan speed in revolutions per minute.
pub const BLADE_RPM: f32 = 2.0;
/// Blind rotation rate while animating, in degrees per second.
pub const BLINDS_DEG_PER_SEC: f32 = 360.0;
/// Blinds swing between closed (0) and fully open.
pub const BLINDS_MAX_DEG: f32 = 55.0;
pub const SWITCH_ON_DEG: f32 = 45.0;
pub const SWITCH_OFF_DEG: f32 = -45.0;

/// Everything in the scene that moves: the fan blades, the window
/// blinds, and the three wall switches. Angles are in degrees.
pub struct AnimationState {
    pub spin: bool,
    pub blade_ang: f32,
    blinds_active: bool,
    blinds_dir: f32,
    pub blinds_ang: f32,
    pub switch1_ang: f32,
    pub switch2_ang: f32,
    pub switch3_ang: f32,
}

impl AnimationState {
    pub fn new() -> Self {
        Self {
            spin: true,
            blade_ang: 0.0,
            blinds_active: false,
            blinds_dir: 1.0,
            blinds_ang: 0.0,
            switch1_ang: SWITCH_ON_DEG,
            switch2_ang: SWITCH_ON_DEG,
            switch3_ang: SWITCH_ON_DEG,
        }
    }

    /// Advances all animated angles by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f32) {
        if self.spin {
            self.blade_ang += BLADE_RPM / 60.0 * 360.0 * dt;
            self.blade_ang %= 360.0;
        }
        if self.blinds_active {
            self.blinds_ang += self.blinds_dir * BLINDS_DEG_PER_SEC * dt;
            if self.blinds_ang >= BLINDS_MAX_DEG {
                self.blinds_ang = BLINDS_MAX_DEG;
                self.blinds_active = false;
                self.blinds_dir = -self.blinds_dir;
            } else if self.blinds_ang <= 0.0 {
                self.blinds_ang = 0.0;
                self.blinds_active = false;
                self.blinds_dir = -self.blinds_dir;
            }
        }
    }

    /// Freezes or resumes the fan and flips its wall switch.
    pub fn toggle_fan(&mut self) {
        self.spin = !self.spin;
        self.switch1_ang = if self.spin {
            SWITCH_ON_DEG
        } else {
            SWITCH_OFF_DEG
        };
    }

    /// Starts the blinds swinging toward the opposite end stop. A
    /// toggle mid-swing pauses at the current angle; the next toggle
    /// resumes toward the same stop.
    pub fn toggle_blinds(&mut self) {
        self.blinds_active = !self.blinds_active;
    }

    pub fn blinds_active(&self) -> bool {
        self.blinds_active
    }

    /// Mirrors a light switch flip on the wall plate geometry.
    pub fn set_light_switch(&mut self, id: LightId, on: bool) {
        let ang = if on { SWITCH_ON_DEG } else { SWITCH_OFF_DEG };
        match id {
            LightId::Point => self.switch2_ang = ang,
            LightId::Spot => self.switch3_ang = ang,
        }
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blades_spin_at_two_rpm() {
        let mut anim = AnimationState::new();
        anim.advance(1.0);
        // 2 rpm is 12 degrees per second
        assert!((anim.blade_ang - 12.0).abs() < 1e-4);
    }

    #[test]
    fn fan_toggle_freezes_blades_and_flips_switch() {
        let mut anim = AnimationState::new();
        anim.toggle_fan();
        assert!(!anim.spin);
        assert_eq!(anim.switch1_ang, SWITCH_OFF_DEG);
        let frozen = anim.blade_ang;
        anim.advance(0.5);
        anim.advance(0.5);
        assert_eq!(anim.blade_ang, frozen);
        anim.toggle_fan();
        assert!(anim.spin);
        assert_eq!(anim.switch1_ang, SWITCH_ON_DEG);
    }

    #[test]
    fn blinds_swing_stops_at_the_far_stop() {
        let mut anim = AnimationState::new();
        anim.toggle_blinds();
        assert!(anim.blinds_active());
        // plenty of time to hit the 55 degree stop
        anim.advance(1.0);
        assert_eq!(anim.blinds_ang, BLINDS_MAX_DEG);
        assert!(!anim.blinds_active());
        // the angle holds until toggled again
        anim.advance(1.0);
        assert_eq!(anim.blinds_ang, BLINDS_MAX_DEG);
    }

    #[test]
    fn second_toggle_swings_back_closed() {
        let mut anim = AnimationState::new();
        anim.toggle_blinds();
        anim.advance(1.0);
        anim.toggle_blinds();
        anim.advance(1.0);
        assert_eq!(anim.blinds_ang, 0.0);
        assert!(!anim.blinds_active());
    }

    #[test]
    fn toggle_during_swing_pauses_then_resumes_same_direction() {
        let mut anim = AnimationState::new();
        anim.toggle_blinds();
        anim.advance(0.05);
        let mid = anim.blinds_ang;
        assert!(mid > 0.0 && mid < BLINDS_MAX_DEG);
        // pause mid-swing, the angle holds where it stopped
        anim.toggle_blinds();
        assert!(!anim.blinds_active());
        anim.advance(0.5);
        assert_eq!(anim.blinds_ang, mid);
        // resume toward the same stop, still opening
        anim.toggle_blinds();
        assert!(anim.blinds_active());
        anim.advance(0.01);
        assert!(anim.blinds_ang > mid);
    }

    #[test]
    fn light_switches_track_their_lights() {
        let mut anim = AnimationState::new();
        anim.set_light_switch(LightId::Point, false);
        assert_eq!(anim.switch2_ang, SWITCH_OFF_DEG);
        assert_eq!(anim.switch3_ang, SWITCH_ON_DEG);
        anim.set_light_switch(LightId::Spot, false);
        assert_eq!(anim.switch3_ang, SWITCH_OFF_DEG);
    }
}
