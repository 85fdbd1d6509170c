use rand::seq::SliceRandom;
use rand::Rng;

/// Источник случайности для нагрузочных сценариев и симуляций.
///
/// Ядро сессии детерминировано и RNG не использует.
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);

    /// Случайное число в `[lo, hi]`.
    fn pick_in_range(&mut self, lo: u32, hi: u32) -> u32;
}

#[derive(Clone, Debug, Default)]
pub struct SystemRng;

impl RandomSource for SystemRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut rand::thread_rng());
    }

    fn pick_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        rand::thread_rng().gen_range(lo..=hi)
    }
}

/// Детерминированный RNG для тестов и реплея.
/// Один и тот же seed даёт один и тот же сценарий нагрузки.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: rand::rngs::StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            inner: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    fn pick_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        self.inner.gen_range(lo..=hi)
    }
}
