pub mod event;
pub mod highscores;
pub mod resolver;
pub mod round;
pub mod step;
pub mod timer;
