//! Grammar compilation errors.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors detected while turning a [`super::Grammar`] into parse tables.
///
/// These are construction-time problems: a grammar that compiles never
/// produces them again at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar '{0}' has no rules")]
    Empty(SmolStr),

    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(SmolStr),

    #[error("'{0}' is declared both as a token and as a rule")]
    TokenRuleClash(SmolStr),

    #[error("undefined symbol '{name}' referenced from rule '{rule}'")]
    UndefinedSymbol { name: SmolStr, rule: SmolStr },

    #[error("extra '{0}' must be a declared token")]
    InvalidExtra(SmolStr),

    #[error("word token '{0}' must be a declared named token")]
    InvalidWord(SmolStr),

    #[error("conflict declaration references unknown rule '{0}'")]
    InvalidConflict(SmolStr),

    #[error("alias '{alias}' in rule '{rule}' must wrap a single symbol")]
    InvalidAlias { alias: SmolStr, rule: SmolStr },

    #[error("rule '{rule}' expands to more than {limit} alternatives")]
    TooManyAlternatives { rule: SmolStr, limit: usize },

    #[error("grammar defines more than {0} symbols")]
    TooManySymbols(usize),

    #[error("lexer setup failed: {0}")]
    Lexer(String),
}
