//! SM-2 Module
//!
//! Classical easiness-factor scheduling, sharing the learning-step machinery
//! with the FSRS scheduler.

mod scheduler;

pub use scheduler::{
    EASY_EASINESS_BONUS, LAPSE_EASINESS_PENALTY, Sm2Parameters, Sm2Phase, Sm2Preview, Sm2Result,
    Sm2Scheduler, Sm2State,
};
