use crate::aggregate::Selector;

/// Narrative shown next to one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commentary {
    pub question: &'static str,
    pub insight: &'static str,
    pub recommendation: &'static str,
}

pub fn commentary(selector: Selector) -> Commentary {
    match selector {
        Selector::StateChurn => Commentary {
            question: "Does churn vary by State? Are some regions losing more customers?",
            insight: "States like WV, MN and NY have the highest number of churners, while states like NJ and NC are lower.",
            recommendation: "Investigate high-churn states for regional causes such as coverage issues, pricing or customer service gaps.",
        },
        Selector::AccountLengthVsChurn => Commentary {
            question: "Does tenure (time with the company) affect churn?",
            insight: "Account length looks very similar for churners and non-churners; the medians and spreads overlap, so tenure alone does not explain churn.",
            recommendation: "Loyalty is not guaranteed by tenure. Focus on service quality and engagement to reduce churn.",
        },
        Selector::IntlPlanChurn => Commentary {
            question: "Do customers with an International Plan churn more often?",
            insight: "Customers with an International Plan churn much more (about 42%) than those without (about 11%).",
            recommendation: "International users are high-value but high-risk: offer competitive pricing, better support or loyalty perks to this segment.",
        },
        Selector::VoicemailPlanChurn => Commentary {
            question: "Is churn different for customers with and without a Voice Mail Plan?",
            insight: "Customers with a Voice Mail Plan churn less (about 9%) than those without (about 17%).",
            recommendation: "Promoting Voice Mail Plans could help reduce churn and improve retention.",
        },
        Selector::ServiceCallsChurn => Commentary {
            question: "After how many customer service calls does churn jump?",
            insight: "Churn stays low for 0-2 calls, jumps sharply from 3 calls on (above 40%) and nears 100% at 9 calls.",
            recommendation: "Flag customers with more than 3 support calls as high-risk and prioritise fast resolution or escalation to retention teams.",
        },
        Selector::ServiceCallsByIntl => Commentary {
            question: "Is the effect of service calls stronger for International Plan users?",
            insight: "International Plan users start with much higher churn (40-45%) that rises faster with each call, reaching 100% after 5 or more calls.",
            recommendation: "Dissatisfied premium customers are the most at risk; give them priority handling and dedicated retention offers.",
        },
        Selector::IntlChargeVsChurn => Commentary {
            question: "For international users, is churn linked to higher international charges?",
            insight: "Among International Plan users, churners show slightly higher total international charges than those who stay.",
            recommendation: "Consider discounted international bundles or loyalty offers for heavy international callers.",
        },
        Selector::TenureBucketByIntl => Commentary {
            question: "Does churn risk by tenure (New, Mid, Long) differ with an International Plan?",
            insight: "In every tenure bucket, International Plan users churn far more (30-45%) than others (10-12%).",
            recommendation: "Target these high-value, high-risk customers with better international pricing and enhanced support.",
        },
        Selector::TenureBucketByVoicemail => Commentary {
            question: "Does churn risk by tenure differ with a Voice Mail Plan?",
            insight: "In every tenure bucket, Voice Mail Plan users churn less (5-9%) than those without (15-17%).",
            recommendation: "Promoting Voice Mail Plans is an effective retention strategy for new and long-term customers alike.",
        },
    }
}

pub const SUMMARY_INSIGHTS: [(&str, &str); 5] = [
    (
        "Customer Profile",
        "WV, MN and NY show the highest churn; account length alone does not predict churn.",
    ),
    (
        "Service Plans",
        "International Plan customers churn almost 4x more; Voice Mail Plan customers churn less (about 9% vs 17%).",
    ),
    (
        "Customer Service",
        "Churn jumps after 3+ service calls, and nears 100% for International Plan users with repeated calls.",
    ),
    (
        "Usage & Charges",
        "Higher international charges correlate with churn among international users.",
    ),
    (
        "Multivariate Findings",
        "International Plan users churn more in every tenure bucket; Voice Mail Plan users churn less at every tenure level.",
    ),
];

pub const RECOMMENDATIONS: [&str; 6] = [
    "Focus retention efforts on high-churn regions (WV, MN, NY) and check local pricing, signal quality and support response times.",
    "Revisit the International Plan: better pricing, loyalty points or premium support for high-value users.",
    "Promote add-on services such as Voice Mail Plans.",
    "Flag customers with more than 3 service calls as high-risk and escalate them early.",
    "Offer discounts to heavy international callers.",
    "Use the churn classifier to detect high-risk customers and trigger retention campaigns before they leave.",
];

pub const KEY_TAKEAWAY: &str =
    "Churn is driven by experience, cost and support, not tenure.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_selector_has_commentary() {
        for selector in Selector::ALL {
            let text = commentary(selector);
            assert!(text.question.ends_with('?'), "{selector}");
            assert!(!text.insight.is_empty());
            assert!(!text.recommendation.is_empty());
        }
    }
}
