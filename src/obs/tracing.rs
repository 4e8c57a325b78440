// self
use crate::{_prelude::*, client::RefreshState, obs::CallStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided stage + HTTP method.
	pub fn new(stage: CallStage, method: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("http_web_client.call", stage = stage.as_str(), method);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, method);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event for a refresh state transition (when enabled).
pub fn trace_refresh_state(state: RefreshState) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(state = state.as_str(), "refresh state changed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = state;
	}
}
