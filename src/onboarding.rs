// SPDX-License-Identifier: MIT
// Copyright 2026 The MewScore Authors

//! Onboarding draft collected before an account exists.

use crate::models::Gender;

/// Transient answers from the onboarding flow.
///
/// Merged into the new profile at registration or first federated
/// sign-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnboardingDraft {
    pub gender: Option<Gender>,
    pub age: Option<u32>,
}

impl OnboardingDraft {
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_fill_answers() {
        let draft = OnboardingDraft::default()
            .with_gender(Gender::Male)
            .with_age(31);
        assert_eq!(draft.gender, Some(Gender::Male));
        assert_eq!(draft.age, Some(31));
        assert_eq!(OnboardingDraft::default().age, None);
    }
}
