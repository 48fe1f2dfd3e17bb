use std::fmt;

use crate::genetics::Genetics;
use crate::grid::Coord;

/// Identity of an agent. Allocated in increasing order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn opposite(self) -> Sex {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Coord,
    pub genetics: Genetics,
    pub reserve: f64,
    pub age: u32,
    pub max_age: u32,
    pub alive: bool,
}

impl Agent {
    pub fn new(
        id: AgentId,
        position: Coord,
        genetics: Genetics,
        reserve: f64,
        max_age: u32,
    ) -> Self {
        Agent {
            id,
            position,
            genetics,
            reserve: reserve.max(0.0),
            age: 0,
            max_age,
            alive: true,
        }
    }

    pub fn sex(&self) -> Sex {
        self.genetics.sex
    }

    pub fn vision(&self) -> u32 {
        self.genetics.vision
    }

    pub fn metabolism(&self) -> f64 {
        self.genetics.metabolism
    }

    /// Adds harvested resource, burns one tick of metabolism and ages by one.
    pub fn live(&mut self, harvested: f64) {
        self.reserve += harvested;
        self.reserve -= self.genetics.metabolism;
        self.age += 1;
    }

    pub fn should_die(&self) -> bool {
        self.reserve <= 0.0 || self.age >= self.max_age
    }

    /// Inside the `[start, end)` fertility window.
    pub fn is_fertile(&self) -> bool {
        (self.genetics.fertility_start..self.genetics.fertility_end).contains(&self.age)
    }

    /// Gives away `fraction` of the reserve and returns the amount.
    pub fn donate(&mut self, fraction: f64) -> f64 {
        let share = self.reserve * fraction;
        self.reserve -= share;
        share
    }

    /// Drawn size in cell units; wealthier agents look larger.
    pub fn size(&self) -> f64 {
        (0.4 + self.reserve / 100.0).min(1.0)
    }
}
