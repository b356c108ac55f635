use oasis_shared::{CustomerId, RecordKind};
use oasis_store::{Direction, Field, Recipe};

use crate::requests::{Request, SkinAnalysisRequest};
use crate::resources::SyncResource;

/// Skin analysis snapshots, latest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinAnalyses;

impl SyncResource for SkinAnalyses {
    fn kind(&self) -> RecordKind {
        RecordKind::SkinAnalysis
    }

    fn screen(&self) -> &'static str {
        "skin-analysis"
    }

    fn request(&self, customer: &CustomerId) -> Request {
        Request::SkinAnalysis(SkinAnalysisRequest::History {
            customer: customer.clone(),
        })
    }

    fn recipe(&self, customer: &CustomerId) -> Recipe {
        Recipe::new(RecordKind::SkinAnalysis)
            .owned_by(customer.clone())
            .sort_by(Field::data("analysed_at"), Direction::Descending)
    }
}
