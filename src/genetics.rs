use rand::Rng;

use crate::agent::Sex;
use crate::config::AgentConfig;

/// Heritable traits of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Genetics {
    pub sex: Sex,
    pub vision: u32,
    pub metabolism: f64,
    pub fertility_start: u32,
    pub fertility_end: u32,
}

impl Genetics {
    pub fn new_random(config: &AgentConfig, rng: &mut impl Rng) -> Self {
        let sex = if rng.random_bool(0.5) { Sex::Male } else { Sex::Female };
        let (start, end) = match sex {
            Sex::Male => (config.male_fertility_start, config.male_fertility_end),
            Sex::Female => (config.female_fertility_start, config.female_fertility_end),
        };

        Genetics {
            sex,
            vision: rng.random_range(config.vision.min..=config.vision.max),
            metabolism: rng.random_range(config.metabolism.min..=config.metabolism.max) as f64,
            fertility_start: rng.random_range(start.min..=start.max),
            fertility_end: rng.random_range(end.min..=end.max),
        }
    }

    /// Each trait comes from one parent, the sex is drawn fresh.
    pub fn cross(&self, other: &Genetics, rng: &mut impl Rng) -> Self {
        let vision = if rng.random_bool(0.5) { self.vision } else { other.vision };
        let metabolism = if rng.random_bool(0.5) { self.metabolism } else { other.metabolism };
        // The window travels as a pair so start < end keeps holding.
        let window = if rng.random_bool(0.5) { self } else { other };
        let sex = if rng.random_bool(0.5) { Sex::Male } else { Sex::Female };

        Genetics {
            sex,
            vision,
            metabolism,
            fertility_start: window.fertility_start,
            fertility_end: window.fertility_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_traits_respect_config_ranges() {
        let config = AgentConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let g = Genetics::new_random(&config, &mut rng);
            assert!((1.0..=4.0).contains(&g.metabolism));
            assert_eq!(g.vision, 6);
            assert_eq!(g.fertility_start, 15);
            match g.sex {
                Sex::Male => assert!((50..=60).contains(&g.fertility_end)),
                Sex::Female => assert!((40..=50).contains(&g.fertility_end)),
            }
        }
    }

    #[test]
    fn crossed_traits_come_from_a_parent() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = Genetics {
            sex: Sex::Male,
            vision: 2,
            metabolism: 1.0,
            fertility_start: 10,
            fertility_end: 40,
        };
        let b = Genetics {
            sex: Sex::Female,
            vision: 5,
            metabolism: 3.0,
            fertility_start: 12,
            fertility_end: 30,
        };
        for _ in 0..50 {
            let child = a.cross(&b, &mut rng);
            assert!(child.vision == 2 || child.vision == 5);
            assert!(child.metabolism == 1.0 || child.metabolism == 3.0);
            assert!(
                (child.fertility_start, child.fertility_end) == (10, 40)
                    || (child.fertility_start, child.fertility_end) == (12, 30)
            );
        }
    }
}
