use jass_bot::bot::{
    MlpTrumpClassifier, PUSH_SCORE_THRESHOLD, TrumpClassifier, TrumpPlanner, TrumpSource,
    score_hand,
};
use jass_bot::policy::{
    HeuristicPolicy, MctsPolicy, MinimaxPolicy, Policy, PolicyContext, RandomPolicy,
};
use jass_bot::bot::{MctsDriver, RewardScale};
use jass_core::model::card::Card;
use jass_core::model::color::Color;
use jass_core::model::deck::Deck;
use jass_core::model::hand::Hand;
use jass_core::model::player::PlayerPosition;
use jass_core::model::rank::Rank;
use jass_core::model::round::GameState;
use jass_core::model::trump::{Trump, TrumpChoice};
use std::io::Write;
use std::sync::Arc;

fn top_nine(color: Color) -> Hand {
    Rank::ORDERED.iter().map(|rank| Card::new(*rank, color)).collect()
}

#[test]
fn full_color_hand_declares_that_color() {
    for color in Color::ALL {
        let hand = top_nine(color);
        let decision = TrumpPlanner::choose(hand, true, None);
        assert_eq!(decision.choice, TrumpChoice::Declare(Trump::from_color(color)));
        assert!(decision.score >= f64::from(PUSH_SCORE_THRESHOLD));
        assert_eq!(decision.source, TrumpSource::Heuristic);
    }
}

#[test]
fn heuristic_never_fails_on_any_deal() {
    for seed in 0..40 {
        let deck = Deck::shuffled_with_seed(seed);
        for hand in deck.hands() {
            for push_allowed in [true, false] {
                let decision = TrumpPlanner::choose(hand, push_allowed, None);
                match decision.choice {
                    TrumpChoice::Push => assert!(push_allowed),
                    TrumpChoice::Declare(trump) => {
                        assert_eq!(f64::from(score_hand(hand, trump)), decision.score);
                    }
                }
            }
        }
    }
}

#[test]
fn classifier_loaded_from_disk_drives_the_choice() {
    let mut model = MlpTrumpClassifier::zeroed();
    model.layer3.biases[Trump::UneUfe.index()] = 3.0;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&model).unwrap().as_bytes())
        .unwrap();

    let loaded = MlpTrumpClassifier::from_file(file.path()).unwrap();
    let probs = loaded.predict_distribution(&top_nine(Color::Hearts));
    assert!(probs[Trump::UneUfe.index()] > 0.30);

    let decision = TrumpPlanner::choose(top_nine(Color::Hearts), true, Some(&loaded));
    assert_eq!(decision.choice, TrumpChoice::Declare(Trump::UneUfe));
    assert_eq!(decision.source, TrumpSource::Classifier);
}

#[test]
fn missing_weight_file_leaves_heuristic_path() {
    assert!(MlpTrumpClassifier::from_file("/nonexistent/trump_weights.json").is_err());
    let decision = TrumpPlanner::choose(top_nine(Color::Clubs), true, None);
    assert_eq!(decision.choice, TrumpChoice::Declare(Trump::Clubs));
}

#[test]
fn every_policy_answers_the_trump_question() {
    let game = GameState::deal(&Deck::shuffled_with_seed(5), PlayerPosition::North);
    let observation = game.observation_for(PlayerPosition::East);
    let ctx = PolicyContext::observed(&observation);
    let classifier: Arc<dyn TrumpClassifier> = Arc::new(MlpTrumpClassifier::zeroed());
    let driver = MctsDriver::new(10, 1.4, RewardScale::Differential);

    let mut policies: Vec<Box<dyn Policy>> = vec![
        Box::new(RandomPolicy::new(1)),
        Box::new(HeuristicPolicy::new()),
        Box::new(HeuristicPolicy::with_classifier(classifier.clone())),
        Box::new(MinimaxPolicy::new(2, 1)),
        Box::new(MctsPolicy::new(driver, 1).with_classifier(classifier)),
    ];
    for policy in policies.iter_mut() {
        let choice = policy.choose_trump(&ctx).unwrap();
        let mut trial = game.clone();
        assert!(trial.declare(PlayerPosition::East, choice).is_ok(), "{}", policy.name());
    }
}

#[test]
fn uniform_classifier_pushes_when_allowed() {
    let game = GameState::deal(&Deck::shuffled_with_seed(6), PlayerPosition::West);
    let observation = game.observation_for(PlayerPosition::North);
    let classifier: Arc<dyn TrumpClassifier> = Arc::new(MlpTrumpClassifier::zeroed());
    let mut policy = HeuristicPolicy::with_classifier(classifier);
    let choice = policy
        .choose_trump(&PolicyContext::observed(&observation))
        .unwrap();
    assert_eq!(choice, TrumpChoice::Push);

    let mut after_push = game.clone();
    after_push.declare(PlayerPosition::North, TrumpChoice::Push).unwrap();
    let partner = after_push.observation_for(PlayerPosition::South);
    let choice = policy
        .choose_trump(&PolicyContext::observed(&partner))
        .unwrap();
    assert_eq!(choice, TrumpChoice::Declare(Trump::Diamonds));
}
