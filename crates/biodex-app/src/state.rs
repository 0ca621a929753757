// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    FieldErrors, Kingdom, Notification, Species, SpeciesField, SpeciesFormInput, SpeciesId,
    SpeciesUpdate, UserId,
};

pub const FETCH_ERROR_TITLE: &str = "Error fetching species";
pub const UPDATE_ERROR_TITLE: &str = "Error updating species";
pub const NO_SELECTION_TITLE: &str = "No species selected";
pub const SAVED_TITLE: &str = "Species updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    NoSelection,
    Selected,
    Submitting,
}

impl DialogPhase {
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogCommand {
    Open,
    Close,
    ChangeUser(UserId),
    CandidatesLoaded {
        request_id: u64,
        result: Result<Vec<Species>, String>,
    },
    MoveCursor(isize),
    SelectAtCursor,
    Select(SpeciesId),
    EditField(SpeciesField, String),
    CycleKingdom(isize),
    Submit,
    SubmitFinished(Result<(), String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    PhaseChanged(DialogPhase),
    FetchRequested { request_id: u64, author: UserId },
    CandidatesReplaced(usize),
    FormReset(SpeciesId),
    FieldEdited(SpeciesField),
    ValidationFailed(FieldErrors),
    UpdateRequested {
        id: SpeciesId,
        update: SpeciesUpdate,
    },
    Notify(Notification),
    Saved(SpeciesId),
}

/// Edit-species dialog: candidate list, selection and the bound form.
///
/// `dispatch` is pure; the caller performs the reads and writes named by
/// `FetchRequested`/`UpdateRequested` and feeds the outcome back through
/// `CandidatesLoaded`/`SubmitFinished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogState {
    pub user: UserId,
    pub phase: DialogPhase,
    pub candidates: Vec<Species>,
    pub cursor: usize,
    pub selected: Option<SpeciesId>,
    pub form: SpeciesFormInput,
    pub field_errors: FieldErrors,
    baseline: SpeciesFormInput,
    pending_fetch: Option<u64>,
    next_request_id: u64,
    refetch_after_submit: bool,
}

impl DialogState {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            phase: DialogPhase::Closed,
            candidates: Vec::new(),
            cursor: 0,
            selected: None,
            form: SpeciesFormInput::default(),
            field_errors: FieldErrors::default(),
            baseline: SpeciesFormInput::default(),
            pending_fetch: None,
            next_request_id: 0,
            refetch_after_submit: false,
        }
    }

    pub fn dispatch(&mut self, command: DialogCommand) -> Vec<DialogEvent> {
        match command {
            DialogCommand::Open => {
                if self.phase.is_open() {
                    return Vec::new();
                }
                self.restart()
            }
            DialogCommand::Close => {
                if !matches!(self.phase, DialogPhase::NoSelection | DialogPhase::Selected) {
                    return Vec::new();
                }
                self.reset_to_closed();
                vec![DialogEvent::PhaseChanged(DialogPhase::Closed)]
            }
            DialogCommand::ChangeUser(user) => {
                if user == self.user {
                    return Vec::new();
                }
                self.user = user;
                match self.phase {
                    DialogPhase::Closed => Vec::new(),
                    DialogPhase::Submitting => {
                        self.refetch_after_submit = true;
                        Vec::new()
                    }
                    DialogPhase::NoSelection | DialogPhase::Selected => self.restart(),
                }
            }
            DialogCommand::CandidatesLoaded { request_id, result } => {
                self.candidates_loaded(request_id, result)
            }
            DialogCommand::MoveCursor(delta) => {
                if !self.accepts_selection() || self.candidates.is_empty() {
                    return Vec::new();
                }
                let last = self.candidates.len() as isize - 1;
                self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
                Vec::new()
            }
            DialogCommand::SelectAtCursor => match self.candidates.get(self.cursor) {
                Some(candidate) => {
                    let id = candidate.id;
                    self.select(id)
                }
                None => Vec::new(),
            },
            DialogCommand::Select(id) => self.select(id),
            DialogCommand::EditField(field, value) => {
                if self.phase != DialogPhase::Selected {
                    return Vec::new();
                }
                *self.form.value_mut(field) = value;
                self.field_errors.clear_field(field);
                vec![DialogEvent::FieldEdited(field)]
            }
            DialogCommand::CycleKingdom(delta) => {
                if self.phase != DialogPhase::Selected {
                    return Vec::new();
                }
                let current = Kingdom::parse(&self.form.kingdom).unwrap_or_default();
                self.form.kingdom = current.rotate(delta).as_str().to_owned();
                self.field_errors.clear_field(SpeciesField::Kingdom);
                vec![DialogEvent::FieldEdited(SpeciesField::Kingdom)]
            }
            DialogCommand::Submit => self.submit(),
            DialogCommand::SubmitFinished(result) => self.submit_finished(result),
        }
    }

    pub fn selected_species(&self) -> Option<&Species> {
        let id = self.selected?;
        self.candidates.iter().find(|species| species.id == id)
    }

    pub fn is_dirty(&self) -> bool {
        self.selected.is_some() && self.form != self.baseline
    }

    pub const fn is_loading(&self) -> bool {
        self.pending_fetch.is_some()
    }

    fn accepts_selection(&self) -> bool {
        matches!(self.phase, DialogPhase::NoSelection | DialogPhase::Selected)
    }

    fn restart(&mut self) -> Vec<DialogEvent> {
        self.clear_dialog();
        self.phase = DialogPhase::NoSelection;
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.pending_fetch = Some(self.next_request_id);
        vec![
            DialogEvent::PhaseChanged(DialogPhase::NoSelection),
            DialogEvent::FetchRequested {
                request_id: self.next_request_id,
                author: self.user.clone(),
            },
        ]
    }

    fn reset_to_closed(&mut self) {
        self.clear_dialog();
        self.phase = DialogPhase::Closed;
    }

    fn clear_dialog(&mut self) {
        self.candidates.clear();
        self.cursor = 0;
        self.selected = None;
        self.form = SpeciesFormInput::default();
        self.baseline = SpeciesFormInput::default();
        self.field_errors = FieldErrors::default();
        self.pending_fetch = None;
        self.refetch_after_submit = false;
    }

    fn candidates_loaded(
        &mut self,
        request_id: u64,
        result: Result<Vec<Species>, String>,
    ) -> Vec<DialogEvent> {
        if !self.phase.is_open() || self.pending_fetch != Some(request_id) {
            return Vec::new();
        }
        self.pending_fetch = None;

        match result {
            Ok(candidates) => {
                self.candidates = candidates;
                self.cursor = 0;
                vec![DialogEvent::CandidatesReplaced(self.candidates.len())]
            }
            Err(message) => {
                self.candidates.clear();
                self.cursor = 0;
                vec![DialogEvent::Notify(Notification::error(
                    FETCH_ERROR_TITLE,
                    message,
                ))]
            }
        }
    }

    fn select(&mut self, id: SpeciesId) -> Vec<DialogEvent> {
        if !self.accepts_selection() {
            return Vec::new();
        }
        let Some(index) = self.candidates.iter().position(|species| species.id == id) else {
            return Vec::new();
        };

        // Switching records drops unsaved edits without asking.
        self.form = SpeciesFormInput::from_species(&self.candidates[index]);
        self.baseline = self.form.clone();
        self.field_errors = FieldErrors::default();
        self.selected = Some(id);
        self.cursor = index;

        let mut events = Vec::new();
        if self.phase != DialogPhase::Selected {
            self.phase = DialogPhase::Selected;
            events.push(DialogEvent::PhaseChanged(DialogPhase::Selected));
        }
        events.push(DialogEvent::FormReset(id));
        events
    }

    fn submit(&mut self) -> Vec<DialogEvent> {
        match self.phase {
            DialogPhase::Closed | DialogPhase::Submitting => Vec::new(),
            DialogPhase::NoSelection => vec![DialogEvent::Notify(Notification::error(
                NO_SELECTION_TITLE,
                "pick a species from the list before saving",
            ))],
            DialogPhase::Selected => {
                let Some(id) = self.selected else {
                    return Vec::new();
                };
                match self.form.validate() {
                    Ok(update) => {
                        self.field_errors = FieldErrors::default();
                        self.phase = DialogPhase::Submitting;
                        vec![
                            DialogEvent::PhaseChanged(DialogPhase::Submitting),
                            DialogEvent::UpdateRequested { id, update },
                        ]
                    }
                    Err(errors) => {
                        self.field_errors = errors.clone();
                        vec![DialogEvent::ValidationFailed(errors)]
                    }
                }
            }
        }
    }

    fn submit_finished(&mut self, result: Result<(), String>) -> Vec<DialogEvent> {
        if self.phase != DialogPhase::Submitting {
            return Vec::new();
        }
        let Some(id) = self.selected else {
            self.phase = DialogPhase::NoSelection;
            return vec![DialogEvent::PhaseChanged(DialogPhase::NoSelection)];
        };

        match result {
            Ok(()) => {
                let name = self.form.scientific_name.trim().to_owned();
                self.reset_to_closed();
                vec![
                    DialogEvent::Notify(Notification::success(
                        SAVED_TITLE,
                        format!("saved changes to {name}"),
                    )),
                    DialogEvent::PhaseChanged(DialogPhase::Closed),
                    DialogEvent::Saved(id),
                ]
            }
            Err(message) => {
                self.phase = DialogPhase::Selected;
                let mut events = vec![
                    DialogEvent::Notify(Notification::error(UPDATE_ERROR_TITLE, message)),
                    DialogEvent::PhaseChanged(DialogPhase::Selected),
                ];
                if self.refetch_after_submit {
                    events.extend(self.restart());
                }
                events
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DialogCommand, DialogEvent, DialogPhase, DialogState, FETCH_ERROR_TITLE,
        NO_SELECTION_TITLE, SAVED_TITLE, UPDATE_ERROR_TITLE,
    };
    use crate::{
        FieldProblem, Kingdom, Notification, Severity, Species, SpeciesField, SpeciesId, UserId,
    };

    fn user(raw: &str) -> UserId {
        UserId::parse(raw).expect("valid user id")
    }

    fn species(id: i64, name: &str) -> Species {
        Species {
            id: SpeciesId::new(id),
            scientific_name: name.to_owned(),
            common_name: None,
            kingdom: Some(Kingdom::Plantae),
            total_population: Some(40),
            image: None,
            description: Some("tall".to_owned()),
            author: user("alice"),
            created_at: None,
        }
    }

    fn open_with(state: &mut DialogState, candidates: Vec<Species>) {
        let events = state.dispatch(DialogCommand::Open);
        let request_id = fetch_request_id(&events).expect("open should request a fetch");
        state.dispatch(DialogCommand::CandidatesLoaded {
            request_id,
            result: Ok(candidates),
        });
    }

    fn fetch_request_id(events: &[DialogEvent]) -> Option<u64> {
        events.iter().find_map(|event| match event {
            DialogEvent::FetchRequested { request_id, .. } => Some(*request_id),
            _ => None,
        })
    }

    fn notification(events: &[DialogEvent]) -> Option<&Notification> {
        events.iter().find_map(|event| match event {
            DialogEvent::Notify(note) => Some(note),
            _ => None,
        })
    }

    #[test]
    fn open_requests_fetch_scoped_to_user() {
        let mut state = DialogState::new(user("alice"));
        let events = state.dispatch(DialogCommand::Open);

        assert_eq!(state.phase, DialogPhase::NoSelection);
        assert!(state.is_loading());
        assert_eq!(
            events,
            vec![
                DialogEvent::PhaseChanged(DialogPhase::NoSelection),
                DialogEvent::FetchRequested {
                    request_id: 1,
                    author: user("alice"),
                },
            ]
        );
        assert!(state.dispatch(DialogCommand::Open).is_empty());
    }

    #[test]
    fn fetch_failure_notifies_and_leaves_list_empty() {
        let mut state = DialogState::new(user("alice"));
        let request_id = fetch_request_id(&state.dispatch(DialogCommand::Open)).expect("fetch");

        let events = state.dispatch(DialogCommand::CandidatesLoaded {
            request_id,
            result: Err("network error".to_owned()),
        });

        let note = notification(&events).expect("error notification");
        assert_eq!(note.title, FETCH_ERROR_TITLE);
        assert_eq!(note.description.as_deref(), Some("network error"));
        assert_eq!(note.severity, Severity::Error);
        assert!(state.candidates.is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.phase, DialogPhase::NoSelection);
    }

    #[test]
    fn stale_fetch_results_are_dropped() {
        let mut state = DialogState::new(user("alice"));
        let first = fetch_request_id(&state.dispatch(DialogCommand::Open)).expect("fetch");
        let second = fetch_request_id(&state.dispatch(DialogCommand::ChangeUser(user("bob"))))
            .expect("user change should refetch");
        assert_ne!(first, second);

        let ignored = state.dispatch(DialogCommand::CandidatesLoaded {
            request_id: first,
            result: Ok(vec![species(1, "Quercus robur")]),
        });
        assert!(ignored.is_empty());
        assert!(state.candidates.is_empty());

        state.dispatch(DialogCommand::CandidatesLoaded {
            request_id: second,
            result: Ok(vec![species(2, "Pinus nigra")]),
        });
        assert_eq!(state.candidates.len(), 1);
        assert_eq!(state.candidates[0].scientific_name, "Pinus nigra");
    }

    #[test]
    fn closing_drops_in_flight_fetch() {
        let mut state = DialogState::new(user("alice"));
        let request_id = fetch_request_id(&state.dispatch(DialogCommand::Open)).expect("fetch");
        state.dispatch(DialogCommand::Close);

        let events = state.dispatch(DialogCommand::CandidatesLoaded {
            request_id,
            result: Ok(vec![species(1, "Quercus robur")]),
        });
        assert!(events.is_empty());
        assert_eq!(state.phase, DialogPhase::Closed);
        assert!(state.candidates.is_empty());
    }

    #[test]
    fn selecting_resets_form_and_discards_edits() {
        let mut state = DialogState::new(user("alice"));
        open_with(
            &mut state,
            vec![species(1, "Quercus robur"), species(2, "Pinus nigra")],
        );

        let events = state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        assert_eq!(
            events,
            vec![
                DialogEvent::PhaseChanged(DialogPhase::Selected),
                DialogEvent::FormReset(SpeciesId::new(1)),
            ]
        );
        assert_eq!(state.form.scientific_name, "Quercus robur");
        assert_eq!(state.form.common_name, "");
        assert_eq!(state.form.kingdom, "Plantae");
        assert!(!state.is_dirty());

        state.dispatch(DialogCommand::EditField(
            SpeciesField::CommonName,
            "English oak".to_owned(),
        ));
        assert!(state.is_dirty());

        state.dispatch(DialogCommand::MoveCursor(1));
        state.dispatch(DialogCommand::SelectAtCursor);
        assert_eq!(state.selected, Some(SpeciesId::new(2)));
        assert_eq!(state.form.scientific_name, "Pinus nigra");
        assert_eq!(state.form.common_name, "");
        assert!(!state.is_dirty());
    }

    #[test]
    fn submit_without_selection_notifies_and_requests_nothing() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);

        let events = state.dispatch(DialogCommand::Submit);
        assert_eq!(events.len(), 1);
        let note = notification(&events).expect("notice expected");
        assert_eq!(note.title, NO_SELECTION_TITLE);
        assert_eq!(state.phase, DialogPhase::NoSelection);
    }

    #[test]
    fn invalid_submit_sets_field_errors_without_update() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);
        state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        state.dispatch(DialogCommand::EditField(
            SpeciesField::Image,
            "not-a-url".to_owned(),
        ));

        let events = state.dispatch(DialogCommand::Submit);
        assert!(matches!(events.as_slice(), [DialogEvent::ValidationFailed(_)]));
        assert_eq!(state.phase, DialogPhase::Selected);
        assert_eq!(
            state.field_errors.for_field(SpeciesField::Image),
            Some(FieldProblem::InvalidUrl)
        );

        state.dispatch(DialogCommand::EditField(SpeciesField::Image, String::new()));
        assert!(state.field_errors.is_empty());
    }

    #[test]
    fn valid_submit_requests_full_update() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);
        state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        state.dispatch(DialogCommand::CycleKingdom(1));

        let events = state.dispatch(DialogCommand::Submit);
        assert_eq!(state.phase, DialogPhase::Submitting);
        let Some(DialogEvent::UpdateRequested { id, update }) = events.get(1) else {
            panic!("expected update request, got {events:?}");
        };
        assert_eq!(*id, SpeciesId::new(1));
        assert_eq!(update.kingdom, Kingdom::Fungi);
        assert_eq!(update.common_name, None);
        assert_eq!(update.total_population, Some(40));
        assert_eq!(update.description.as_deref(), Some("tall"));

        assert!(state.dispatch(DialogCommand::Submit).is_empty());
        assert!(state.dispatch(DialogCommand::Close).is_empty());
    }

    #[test]
    fn update_failure_keeps_dialog_and_edits() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);
        state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        state.dispatch(DialogCommand::EditField(
            SpeciesField::CommonName,
            "Oak".to_owned(),
        ));
        state.dispatch(DialogCommand::Submit);

        let events = state.dispatch(DialogCommand::SubmitFinished(Err(
            "permission denied".to_owned(),
        )));
        let note = notification(&events).expect("error notification");
        assert_eq!(note.title, UPDATE_ERROR_TITLE);
        assert_eq!(note.description.as_deref(), Some("permission denied"));
        assert_eq!(state.phase, DialogPhase::Selected);
        assert_eq!(state.form.common_name, "Oak");
    }

    #[test]
    fn update_success_closes_and_reports_saved() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);
        state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        state.dispatch(DialogCommand::Submit);

        let events = state.dispatch(DialogCommand::SubmitFinished(Ok(())));
        let note = notification(&events).expect("success notification");
        assert_eq!(note.title, SAVED_TITLE);
        assert_eq!(note.severity, Severity::Success);
        assert!(events.contains(&DialogEvent::Saved(SpeciesId::new(1))));
        assert_eq!(state.phase, DialogPhase::Closed);
        assert!(state.candidates.is_empty());
        assert_eq!(state.selected, None);

        let reopened = state.dispatch(DialogCommand::Open);
        assert_eq!(state.phase, DialogPhase::NoSelection);
        assert!(fetch_request_id(&reopened).is_some());
    }

    #[test]
    fn user_change_during_submit_refetches_after_failure() {
        let mut state = DialogState::new(user("alice"));
        open_with(&mut state, vec![species(1, "Quercus robur")]);
        state.dispatch(DialogCommand::Select(SpeciesId::new(1)));
        state.dispatch(DialogCommand::Submit);

        assert!(state.dispatch(DialogCommand::ChangeUser(user("bob"))).is_empty());
        let events = state.dispatch(DialogCommand::SubmitFinished(Err("timeout".to_owned())));
        assert!(fetch_request_id(&events).is_some());
        assert_eq!(state.phase, DialogPhase::NoSelection);
        assert!(state.candidates.is_empty());
    }
}
