pub mod bot;
pub mod policy;

pub use bot::{
    CardStats, ClassifierError, FlatMonteCarlo, Horizon, MctsDecision, MctsDriver,
    MlpTrumpClassifier, RewardScale, RolloutEvaluator, SearchError, SearchParams, SolvedMove,
    StatsTable, TrickSolver, TrumpClassifier, TrumpDecision, TrumpPlanner, TrumpSource,
    WorldSource,
};
pub use policy::{
    DecisionError, FlatMonteCarloPolicy, GameView, HeuristicPolicy, MctsPolicy, MinimaxPolicy,
    Policy, PolicyContext, RandomPolicy,
};
