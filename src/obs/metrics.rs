// self
use crate::{
	client::RefreshState,
	obs::{CallOutcome, CallStage},
};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(stage: CallStage, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"http_web_client_call_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Records a refresh state transition via the global metrics recorder (when enabled).
pub fn record_refresh_state(state: RefreshState) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("http_web_client_refresh_state_total", "state" => state.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = state;
	}
}
