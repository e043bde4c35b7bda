//! Structural policy owned by the assembler and finalizer: fixed node ids,
//! label budgets, and the weight assigned to each structural edge kind.

/// Fixed id of the layer-0 question node.
pub const QUESTION_NODE_ID: &str = "question";

/// Fixed id of the layer-0 answer-root node.
pub const ANSWER_ROOT_ID: &str = "answer";

/// Weight of `answers` edges (question → root, root → block).
pub const ANSWERS_WEIGHT: f32 = 1.0;

/// Weight of `supports` edges (block → direct source).
pub const SUPPORTS_WEIGHT: f32 = 0.95;

/// Weight of `underpins` edges (direct source → concept).
pub const UNDERPINS_WEIGHT: f32 = 0.9;

/// Character budget for the answer-root label and block/source labels.
pub const ANSWER_LABEL_BUDGET: usize = 100;

/// Character budget for the question label.
pub const QUESTION_LABEL_BUDGET: usize = 80;
