//! The flow engine: one event in, one reply out.
//!
//! Every handler validates the current state first; events that are valid
//! elsewhere get a corrective prompt and no transition. Nothing in here is
//! fatal — every failure path degrades to a reply and a defined state.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::affiliate::LinkBuilder;
use crate::config::AppConfig;
use crate::flow::{Event, FlowState, UserRef};
use crate::leads::{Lead, LeadSink};
use crate::model::SearchRequest;
use crate::render::{self, Reply};
use crate::search::SearchOrchestrator;
use crate::session::{SessionStore, UserSession};
use crate::tier::TierGate;
use crate::tiering::TierPolicy;

/// Drives the per-user conversation. One logical handler runs per user at a
/// time: each session sits behind its own mutex, so a double-tap queues
/// rather than races.
pub struct FlowEngine {
    orchestrator: SearchOrchestrator,
    sessions: Arc<SessionStore>,
    links: LinkBuilder,
    tier: Arc<dyn TierGate>,
    leads: Arc<dyn LeadSink>,
    policy: TierPolicy,
    config: AppConfig,
}

impl FlowEngine {
    pub fn new(
        orchestrator: SearchOrchestrator,
        sessions: Arc<SessionStore>,
        links: LinkBuilder,
        tier: Arc<dyn TierGate>,
        leads: Arc<dyn LeadSink>,
        config: AppConfig,
    ) -> Self {
        Self {
            orchestrator,
            sessions,
            links,
            tier,
            leads,
            policy: TierPolicy {
                free_count: config.free_count,
                page_size: config.page_size,
            },
            config,
        }
    }

    fn advance(s: &mut UserSession, target: FlowState) {
        debug_assert!(s.state.can_transition_to(target), "{} -> {target}", s.state);
        s.state = target;
    }

    /// Handle one user event and produce the reply to render.
    pub async fn handle(&self, user: &UserRef, event: Event) -> Reply {
        tracing::debug!(user = %user.id, event = event.kind(), "handling event");
        let session = self.sessions.get_or_create(&user.id).await;

        match event {
            Event::Start => {
                let mut s = session.lock().await;
                s.reset();
                Self::advance(&mut s, FlowState::SelectingOrigin);
                s.touch();
                render::origin_prompt()
            }
            Event::Reset => {
                let mut s = session.lock().await;
                s.reset();
                s.touch();
                render::idle_prompt()
            }
            Event::OriginChosen(code) => {
                let mut s = session.lock().await;
                s.touch();
                if s.state != FlowState::SelectingOrigin {
                    return render::corrective(s.state);
                }
                s.origin = Some(code);
                Self::advance(&mut s, FlowState::SelectingDestination);
                render::destination_prompt(code)
            }
            Event::DestinationChosen(code) => {
                let mut s = session.lock().await;
                s.touch();
                if s.state != FlowState::SelectingDestination {
                    return render::corrective(s.state);
                }
                let Some(origin) = s.origin else {
                    tracing::error!(user = %user.id, "destination chosen with no origin recorded");
                    s.reset();
                    return render::restart_prompt();
                };
                if origin == code {
                    // Re-prompt, no transition.
                    return render::same_route_prompt(code);
                }
                s.destination = Some(code);
                Self::advance(&mut s, FlowState::SelectingDate);
                render::date_prompt(origin, code)
            }
            Event::DateChosen(date) => self.run_search(user, &session, date).await,
            Event::ShowMore => {
                let mut s = session.lock().await;
                s.touch();
                if s.state != FlowState::ShowingResults {
                    return render::corrective(s.state);
                }
                let next_page = s.page + 1;
                let view = self
                    .policy
                    .page(s.results.len(), s.is_paid_tier, next_page);
                if view.is_empty() {
                    // Next page renders nothing new: report, keep the page.
                    return render::no_more_results_alert();
                }
                s.page = next_page;
                self.render_results(&s)
            }
            Event::SelectOffer(index) => {
                let mut s = session.lock().await;
                s.touch();
                if s.state != FlowState::ShowingResults {
                    return render::corrective(s.state);
                }
                let visible = self.policy.visible_count(s.results.len(), s.is_paid_tier);
                if index >= visible {
                    tracing::debug!(user = %user.id, index, visible, "offer selection out of range");
                    return render::out_of_range_alert();
                }
                let Some(request) = self.session_request(&s) else {
                    tracing::error!(user = %user.id, state = %s.state, "results shown without a recorded request");
                    s.reset();
                    return render::restart_prompt();
                };
                s.selected_offer = Some(index);
                Self::advance(&mut s, FlowState::AwaitingContact);
                let offer = &s.results.offers[index];
                let url = self.links.build(offer, &request, &user.id);
                render::contact_prompt(index + 1, offer, url)
            }
            Event::ContactProvided(phone) => self.capture_contact(user, &session, phone).await,
        }
    }

    /// Date chosen: record it, fan out the search without holding the
    /// session lock, then apply the results only if the session has not
    /// moved on meanwhile.
    async fn run_search(
        &self,
        user: &UserRef,
        session: &Arc<tokio::sync::Mutex<UserSession>>,
        date: NaiveDate,
    ) -> Reply {
        let (request, generation) = {
            let mut s = session.lock().await;
            s.touch();
            if s.state != FlowState::SelectingDate {
                return render::corrective(s.state);
            }
            let (Some(origin), Some(destination)) = (s.origin, s.destination) else {
                // Broken invariant, not user input: log it as a defect signal.
                tracing::error!(user = %user.id, state = %s.state, "date chosen with missing route fields");
                s.reset();
                return render::restart_prompt();
            };
            let request = match SearchRequest::new(
                origin,
                destination,
                date,
                self.config.date_flex_days,
                self.config.result_limit,
            ) {
                Ok(r) => r,
                Err(err) => return render::validation_prompt(&err),
            };
            s.depart_date = Some(date);
            s.page = 0;
            s.search_generation += 1;
            (request, s.search_generation)
        };

        let results = self.orchestrator.search(&request).await;
        let is_paid = self.tier.is_paid(&user.id).await;

        let mut s = session.lock().await;
        if s.search_generation != generation || s.state != FlowState::SelectingDate {
            tracing::debug!(user = %user.id, "discarding stale search results");
            return Reply::silent();
        }

        s.results = results;
        s.is_paid_tier = is_paid;
        s.page = 0;
        Self::advance(&mut s, FlowState::ShowingResults);

        if s.results.is_empty() {
            return render::no_results(&request);
        }

        let view = self.policy.page(s.results.len(), is_paid, 0);
        let pay_link = if view.gated_count > 0 && !is_paid {
            match self.tier.create_invoice(&user.id).await {
                Ok(invoice) => invoice.pay_link,
                Err(err) => {
                    tracing::warn!(user = %user.id, %err, "invoice creation failed");
                    None
                }
            }
        } else {
            None
        };

        render::results_page(&request, &s.results, &view, pay_link.as_deref())
    }

    async fn capture_contact(
        &self,
        user: &UserRef,
        session: &Arc<tokio::sync::Mutex<UserSession>>,
        phone: String,
    ) -> Reply {
        let mut s = session.lock().await;
        s.touch();
        if s.state != FlowState::AwaitingContact {
            return render::corrective(s.state);
        }
        let (Some(index), Some(origin), Some(destination), Some(depart_date)) =
            (s.selected_offer, s.origin, s.destination, s.depart_date)
        else {
            tracing::error!(user = %user.id, "contact received without a recorded selection");
            s.reset();
            return render::restart_prompt();
        };
        let Some(offer) = s.results.get(index).cloned() else {
            tracing::error!(user = %user.id, index, "selected offer vanished from the result set");
            s.reset();
            return render::restart_prompt();
        };

        let lead = Lead {
            id: uuid::Uuid::new_v4(),
            user_id: user.id.clone(),
            user_display: user.display(),
            origin,
            destination,
            depart_date,
            option_number: index + 1,
            price: offer.price,
            currency: offer.currency.clone(),
            airline: offer.airline.clone(),
            departure_at: offer.departure_at.clone(),
            phone,
            created_at: Utc::now(),
        };

        if let Err(err) = self.leads.submit(lead).await {
            // The user still gets thanked; the lead is recoverable from logs.
            tracing::error!(user = %user.id, %err, "lead submission failed");
        }

        s.reset();
        render::thanks()
    }

    /// Current page for the session's recorded results.
    fn render_results(&self, s: &UserSession) -> Reply {
        let Some(request) = self.session_request(s) else {
            return render::restart_prompt();
        };
        let view = self.policy.page(s.results.len(), s.is_paid_tier, s.page);
        render::results_page(&request, &s.results, &view, None)
    }

    /// Rebuild the request the current results answer. Deterministic for a
    /// given session + config, which keeps re-rendered affiliate links
    /// identical.
    fn session_request(&self, s: &UserSession) -> Option<SearchRequest> {
        let (origin, destination, date) = (s.origin?, s.destination?, s.depart_date?);
        SearchRequest::new(
            origin,
            destination,
            date,
            self.config.date_flex_days,
            self.config.result_limit,
        )
        .ok()
    }
}
