use super::*;


#[derive(Clone, Debug)]
pub struct Game {
    phase: Phase,
    score: u32,
    lives: u32,
    elapsed_ms: f64,
    difficulty: Difficulty,
    spawn_accumulator_ms: f64,
    play_area: PlayArea,
    objects: Vec<FallingObject>,
    particles: Vec<Particle>,
    residues: Vec<GroundResidue>,
    powerup: PowerupState,
    next_object_id: u32,
    rng: SeededRng,
    events: Vec<GameEvent>,
}

const OBJECT_VEC_CAPACITY: usize = 8;
const PARTICLE_VEC_CAPACITY: usize = BURST_PARTICLE_COUNT * 8;

impl Game {
    /// A fresh game sitting in the menu. Call [`Game::start`] to play.
    pub fn new(seed: u32, play_area: PlayArea) -> Self {
        Self {
            phase: Phase::Menu,
            score: 0,
            lives: STARTING_LIVES,
            elapsed_ms: 0.0,
            difficulty: Difficulty::at(0.0),
            spawn_accumulator_ms: 0.0,
            play_area,
            objects: Vec::with_capacity(OBJECT_VEC_CAPACITY),
            particles: Vec::with_capacity(PARTICLE_VEC_CAPACITY),
            residues: Vec::new(),
            powerup: PowerupState::default(),
            next_object_id: 0,
            rng: SeededRng::new(seed),
            events: Vec::new(),
        }
    }

    /// Resets every run-scoped value and enters `Playing`. The RNG stream
    /// carries on so consecutive runs differ.
    pub fn start(&mut self) {
        self.phase = Phase::Playing;
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.elapsed_ms = 0.0;
        self.difficulty = Difficulty::at(0.0);
        self.spawn_accumulator_ms = 0.0;
        self.objects.clear();
        self.particles.clear();
        self.residues.clear();
        self.powerup.clear();
        self.next_object_id = 0;
        self.events.clear();
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Playing;
        true
    }

    pub fn resize(&mut self, play_area: PlayArea) {
        self.play_area = play_area;
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Accumulated score; this is what gets submitted.
    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Score as shown to the player, doubled while the multiplier runs.
    #[inline]
    pub fn display_score(&self) -> u32 {
        self.score.saturating_mul(self.powerup.score_multiplier())
    }

    #[inline]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[inline]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[inline]
    pub fn powerup(&self) -> &PowerupState {
        &self.powerup
    }

    #[inline]
    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            phase: self.phase,
            score: self.score,
            display_score: self.display_score(),
            lives: self.lives,
            elapsed_ms: self.elapsed_ms,
            difficulty: self.difficulty,
            powerup: self.powerup.snapshot(),
            play_area: self.play_area,
            objects: self.objects.clone(),
            particles: self.particles.clone(),
            residues: self.residues.clone(),
        }
    }

    /// Advances one tick. `delta_ms` is clamped to `[0, MAX_TICK_MS]`.
    /// Outside `Playing` this does nothing and returns no events.
    pub fn step(&mut self, delta_ms: f64, pointer: PointerState) -> Vec<GameEvent> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        let dt_ms = clamp_tick_ms(delta_ms);

        self.elapsed_ms += dt_ms;
        self.difficulty = Difficulty::at(self.elapsed_ms);
        self.update_spawning(dt_ms);
        self.integrate(dt_ms);
        if let Some(kind) = self.powerup.tick(dt_ms) {
            self.events.push(GameEvent::PowerupExpired { kind });
        }
        if pointer.pressed {
            self.resolve_pointer_hits(pointer.x, pointer.y);
        }
        self.cull_fallen_objects();
        self.particles.retain(|particle| particle.life > 0.0);
        self.residues.retain(|residue| residue.remaining_ms > 0.0);

        core::mem::take(&mut self.events)
    }

    fn update_spawning(&mut self, dt_ms: f64) {
        self.spawn_accumulator_ms += dt_ms;

        if self.spawn_accumulator_ms >= self.difficulty.spawn_interval_ms
            && self.objects.len() < self.difficulty.max_objects
            && self.play_area.can_spawn()
        {
            self.spawn_object();
            // Reset rather than subtract so a long gap never causes a burst.
            self.spawn_accumulator_ms = 0.0;
        }
    }

    fn spawn_object(&mut self) {
        let kind = ObjectKind::from_draw(self.rng.next_unit());
        let span = self.play_area.width - OBJECT_RADIUS * 2.0;
        let x = OBJECT_RADIUS + self.rng.next_unit() * span;
        let rotation_speed = self
            .rng
            .next_range_f32(-OBJECT_ROTATION_SPEED_MAX, OBJECT_ROTATION_SPEED_MAX);

        let id = self.next_object_id;
        self.next_object_id = self.next_object_id.wrapping_add(1);
        self.objects.push(FallingObject {
            id,
            kind,
            x,
            y: OBJECT_SPAWN_Y,
            speed: self.difficulty.object_speed(),
            radius: OBJECT_RADIUS,
            rotation: 0.0,
            rotation_speed,
        });
        self.events.push(GameEvent::ObjectSpawned { id, kind });
    }

    fn integrate(&mut self, dt_ms: f64) {
        let dt_s = (dt_ms / 1_000.0) as f32;

        for object in &mut self.objects {
            object.y += object.speed * dt_s;
            object.rotation += object.rotation_speed * dt_s;
        }

        for particle in &mut self.particles {
            particle.x += particle.vx * dt_s;
            particle.y += particle.vy * dt_s;
            particle.vy += PARTICLE_GRAVITY_PER_TICK;
            particle.life -= PARTICLE_DECAY_PER_TICK;
        }

        for residue in &mut self.residues {
            residue.remaining_ms -= dt_ms;
        }
    }

    /// Every object under the pointer is hit once, in spawn order. A
    /// board clear triggered mid-scan consumes the rest of the board.
    fn resolve_pointer_hits(&mut self, px: f32, py: f32) {
        let mut index = 0;
        while index < self.objects.len() {
            let object = self.objects[index];
            let dx = px - object.x;
            let dy = py - object.y;
            if dx * dx + dy * dy < object.radius * object.radius {
                self.objects.remove(index);
                self.hit_object(object);
            } else {
                index += 1;
            }
        }
    }

    fn hit_object(&mut self, object: FallingObject) {
        self.spawn_burst(object.x, object.y);
        let points = object.kind.points();
        self.add_score(points);
        self.events.push(GameEvent::ObjectHit {
            id: object.id,
            kind: object.kind,
            points,
        });

        if object.kind == ObjectKind::Powerup {
            let kind = PowerupKind::draw(&mut self.rng);
            self.activate_powerup(kind);
        }
    }

    fn activate_powerup(&mut self, kind: PowerupKind) {
        self.powerup.activate(kind);
        self.events.push(GameEvent::PowerupActivated { kind });
        if kind == PowerupKind::ClearBoard {
            self.clear_board();
        }
    }

    /// Destroys every live object for its hit value. Nothing cleared this
    /// way costs a life or chains into another power-up.
    fn clear_board(&mut self) {
        let cleared = core::mem::take(&mut self.objects);
        let mut points = 0u32;
        for object in &cleared {
            self.spawn_burst(object.x, object.y);
            points = points.saturating_add(object.kind.points());
        }
        self.add_score(points);
        self.events.push(GameEvent::BoardCleared {
            objects: cleared.len(),
            points,
        });
    }

    fn spawn_burst(&mut self, x: f32, y: f32) {
        for i in 0..BURST_PARTICLE_COUNT {
            let angle = (i as f32 / BURST_PARTICLE_COUNT as f32) * core::f32::consts::TAU;
            let speed = PARTICLE_SPEED_MIN + self.rng.next_unit() * PARTICLE_SPEED_SPREAD;
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
            });
        }
    }

    fn cull_fallen_objects(&mut self) {
        let lower_bound = self.play_area.lower_bound();
        let mut index = 0;
        while index < self.objects.len() {
            if self.objects[index].y <= lower_bound {
                index += 1;
                continue;
            }
            let object = self.objects.remove(index);
            if object.kind == ObjectKind::Hazardous {
                self.residues.push(GroundResidue {
                    x: object.x,
                    remaining_ms: GROUND_RESIDUE_LIFETIME_MS,
                });
                self.lose_life();
            }
        }
    }

    fn lose_life(&mut self) {
        if self.lives == 0 {
            return;
        }
        self.lives -= 1;
        self.events.push(GameEvent::LifeLost { lives: self.lives });

        if self.lives == 0 && self.phase == Phase::Playing {
            self.phase = Phase::Over;
            self.events.push(GameEvent::GameOver {
                final_score: self.score,
            });
        }
    }

    #[inline]
    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    #[cfg(test)]
    fn push_object(&mut self, kind: ObjectKind, x: f32, y: f32) -> u32 {
        let id = self.next_object_id;
        self.next_object_id += 1;
        self.objects.push(FallingObject {
            id,
            kind,
            x,
            y,
            speed: self.difficulty.object_speed(),
            radius: OBJECT_RADIUS,
            rotation: 0.0,
            rotation_speed: 0.0,
        });
        id
    }

    #[cfg(test)]
    fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }
}
