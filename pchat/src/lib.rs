//! Provider-agnostic chat turn orchestration.
//!
//! This crate owns everything between "user typed a message" and "assistant
//! produced an answer": conversation history, the middleware pipeline, the
//! tool loop, retry handling around provider calls, and the buffered and
//! streaming execution paths. Concrete model backends implement
//! [`pprovider::ChatProvider`] and plug in unchanged.

mod engine;
mod error;
mod history;
mod middleware;
mod stream;
mod toolcall;
mod transform;
mod types;

pub use engine::{ChatEngine, ChatEngineBuilder};
pub use error::{ChatError, ChatErrorKind, ChatErrorSource};
pub use history::{ConversationState, HistoryObserver};
pub use middleware::{Middleware, MiddlewareCtx, MiddlewarePipeline, StateMap, ToolErrorDirective};
pub use toolcall::TOOL_CALL_DECLINED_NOTICE;
pub use transform::{FnRequestTransform, FnResponseTransform, RequestTransform, ResponseTransform};
pub use types::{
    ConfirmToolCall, EnginePolicy, FnConfirm, ToolCallMode, TurnEvent, TurnOptions, TurnOutcome,
    TurnStream,
};

pub mod prelude {
    //! Single-line import for engine consumers.

    pub use crate::{
        ChatEngine, ChatEngineBuilder, ChatError, ChatErrorKind, ChatErrorSource,
        ConfirmToolCall, ConversationState, EnginePolicy, HistoryObserver, Middleware,
        MiddlewareCtx, MiddlewarePipeline, StateMap, ToolCallMode, ToolErrorDirective, TurnEvent,
        TurnOptions, TurnOutcome, TurnStream,
    };
}
