//! Floating hearts behind the board.
//!
//! Pure simulation; the GUI steps it once per frame and paints each
//! [`Heart`] with cairo.

use std::f64::consts::TAU;

use rand::Rng;

pub const AMBIENT_COUNT: usize = 40;
pub const CELEBRATION_COUNT: usize = 40;
pub const NARROW_WIDTH: f64 = 600.0;
const NARROW_FACTOR: f64 = 0.6;
const INTERACTION_RADIUS: f64 = 55.0;
const PUSH: f64 = 15.0;
const DAMPING: f64 = 0.9;
const MARGIN: f64 = 50.0;
const BURST_SIZE: f64 = 32.0;

pub const PALETTE: [(f64, f64, f64); 5] = [
    (1.0, 0.604, 0.620),
    (0.980, 0.816, 0.769),
    (1.0, 0.925, 0.824),
    (0.988, 0.714, 0.624),
    (1.0, 0.718, 0.773),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Heart {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: usize,
    pub opacity: f64,
    speed_x: f64,
    speed_y: f64,
    wobble: f64,
    wobble_speed: f64,
    vx: f64,
    vy: f64,
    pushable: bool,
    // Transient hearts leave the field instead of respawning.
    transient: bool,
}

#[derive(Debug, Default)]
pub struct HeartField {
    width: f64,
    height: f64,
    pointer: Option<(f64, f64)>,
    hearts: Vec<Heart>,
}

impl HeartField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hearts(&self) -> &[Heart] {
        &self.hearts
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Target ambient population for the current width.
    pub fn ambient_target(&self) -> usize {
        if self.width < NARROW_WIDTH {
            (AMBIENT_COUNT as f64 * NARROW_FACTOR) as usize
        } else {
            AMBIENT_COUNT
        }
    }

    /// Repopulates the field for a new canvas size.
    pub fn resize<R: Rng + ?Sized>(&mut self, width: f64, height: f64, rng: &mut R) {
        if (width - self.width).abs() < f64::EPSILON && (height - self.height).abs() < f64::EPSILON {
            return;
        }
        self.width = width;
        self.height = height;
        self.hearts.clear();
        for _ in 0..self.ambient_target() {
            let heart = self.spawn(true, rng);
            self.hearts.push(heart);
        }
    }

    pub fn set_pointer(&mut self, pointer: Option<(f64, f64)>) {
        self.pointer = pointer;
    }

    fn spawn<R: Rng + ?Sized>(&self, anywhere: bool, rng: &mut R) -> Heart {
        let y = if anywhere {
            rng.random::<f64>() * self.height
        } else {
            self.height + 20.0
        };
        Heart {
            x: rng.random::<f64>() * self.width,
            y,
            size: rng.random_range(5.0..15.0),
            color: rng.random_range(0..PALETTE.len()),
            opacity: rng.random_range(0.3..0.8),
            speed_x: rng.random_range(-0.25..0.25),
            speed_y: rng.random_range(0.5..2.0),
            wobble: rng.random::<f64>() * TAU,
            wobble_speed: rng.random_range(0.02..0.07),
            vx: 0.0,
            vy: 0.0,
            pushable: true,
            transient: false,
        }
    }

    /// One large heart rising from a matched card.
    pub fn burst_at<R: Rng + ?Sized>(&mut self, x: f64, y: f64, rng: &mut R) {
        let mut heart = self.spawn(false, rng);
        heart.x = x;
        heart.y = y;
        heart.size = BURST_SIZE;
        heart.speed_x = rng.random_range(-0.25..0.25);
        heart.opacity = 0.9;
        heart.pushable = false;
        heart.transient = true;
        self.hearts.push(heart);
    }

    /// A cloud of hearts from the centre, for a won round.
    pub fn celebrate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        for _ in 0..CELEBRATION_COUNT {
            let mut heart = self.spawn(false, rng);
            heart.x = cx + rng.random_range(-30.0..30.0);
            heart.y = cy + rng.random_range(-30.0..30.0);
            heart.size = rng.random_range(8.0..24.0);
            heart.speed_y = rng.random_range(1.5..4.5);
            heart.speed_x = rng.random_range(-1.0..1.0);
            heart.opacity = rng.random_range(0.6..1.0);
            heart.transient = true;
            self.hearts.push(heart);
        }
    }

    /// Advances every heart by one frame.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let pointer = self.pointer;
        let width = self.width;
        let mut respawn = Vec::new();

        for (idx, heart) in self.hearts.iter_mut().enumerate() {
            heart.wobble += heart.wobble_speed;
            heart.y -= heart.speed_y;
            heart.x += heart.wobble.sin() * 0.5 + heart.speed_x;

            if heart.pushable
                && let Some((px, py)) = pointer
            {
                let (dx, dy) = (heart.x - px, heart.y - py);
                let dist = dx.hypot(dy);
                if dist < INTERACTION_RADIUS {
                    let force = (INTERACTION_RADIUS - dist) / INTERACTION_RADIUS;
                    let angle = dy.atan2(dx);
                    heart.vx += angle.cos() * force * PUSH;
                    heart.vy += angle.sin() * force * PUSH;
                }
            }
            heart.x += heart.vx;
            heart.y += heart.vy;
            heart.vx *= DAMPING;
            heart.vy *= DAMPING;

            if heart.y < -MARGIN || heart.x < -MARGIN || heart.x > width + MARGIN {
                respawn.push(idx);
            }
        }

        for idx in respawn.into_iter().rev() {
            if self.hearts[idx].transient {
                self.hearts.swap_remove(idx);
            } else {
                self.hearts[idx] = self.spawn(false, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn field(width: f64, height: f64) -> (HeartField, StdRng) {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = HeartField::new();
        field.resize(width, height, &mut rng);
        (field, rng)
    }

    #[test]
    fn narrow_screens_get_fewer_hearts() {
        let (wide, _) = field(1024.0, 768.0);
        let (narrow, _) = field(400.0, 800.0);
        assert_eq!(wide.hearts().len(), 40);
        assert_eq!(narrow.hearts().len(), 24);
    }

    #[test]
    fn ambient_population_is_stable_over_time() {
        let (mut field, mut rng) = field(800.0, 600.0);
        for _ in 0..2000 {
            field.step(&mut rng);
        }
        assert_eq!(field.hearts().len(), AMBIENT_COUNT);
        assert!(field.hearts().iter().all(|h| h.y <= 620.0 + 1.0));
    }

    #[test]
    fn celebration_hearts_drift_away() {
        let (mut field, mut rng) = field(800.0, 600.0);
        field.celebrate(&mut rng);
        field.burst_at(100.0, 100.0, &mut rng);
        assert_eq!(field.hearts().len(), AMBIENT_COUNT + CELEBRATION_COUNT + 1);
        for _ in 0..2000 {
            field.step(&mut rng);
        }
        assert_eq!(field.hearts().len(), AMBIENT_COUNT);
    }

    #[test]
    fn pointer_pushes_nearby_hearts_away() {
        let (mut field, mut rng) = field(800.0, 600.0);
        field.hearts.truncate(1);
        let heart = &mut field.hearts[0];
        heart.x = 400.0;
        heart.y = 300.0;
        heart.speed_x = 0.0;
        heart.speed_y = 0.0;
        heart.wobble = 0.0;
        heart.wobble_speed = 0.0;
        field.set_pointer(Some((390.0, 300.0)));
        field.step(&mut rng);
        assert!(field.hearts()[0].x > 405.0);
    }
}
