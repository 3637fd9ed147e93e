pub mod card;
pub mod color;
pub mod deck;
pub mod hand;
pub mod observation;
pub mod player;
pub mod rank;
pub mod round;
pub mod score;
pub mod trick;
pub mod trump;
