use std::collections::BTreeSet;

use serde::Serialize;

/// Pages of the profile form, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FormStep {
    #[default]
    Personal,
    Background,
    Needs,
}

impl FormStep {
    pub const COUNT: usize = 3;

    pub fn number(self) -> usize {
        match self {
            Self::Personal => 1,
            Self::Background => 2,
            Self::Needs => 3,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Personal => Some(Self::Background),
            Self::Background => Some(Self::Needs),
            Self::Needs => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Personal => None,
            Self::Background => Some(Self::Personal),
            Self::Needs => Some(Self::Background),
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::Personal => &[Field::State, Field::Age, Field::Gender],
            Self::Background => &[Field::Category, Field::SocialCategory, Field::Income],
            Self::Needs => &[Field::Sector, Field::Disability, Field::SupportNeeds],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    State,
    Age,
    Gender,
    Category,
    SocialCategory,
    Income,
    Sector,
    Disability,
    SupportNeeds,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::State => "State",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::Category => "Category",
            Self::SocialCategory => "Social category",
            Self::Income => "Annual income",
            Self::Sector => "Sector",
            Self::Disability => "Disability",
            Self::SupportNeeds => "Support needed",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Category => "category",
            Self::SocialCategory => "social_category",
            Self::Income => "income",
            Self::Sector => "sector",
            Self::Disability => "disability",
            Self::SupportNeeds => "support_needs",
        }
    }

    pub fn is_required(self) -> bool {
        self != Self::SupportNeeds
    }
}

/// Form input as the user is editing it. Anything may be blank here;
/// [`FormDraft::to_profile`] is the only way to a [`FormProfile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub state: String,
    pub age: String,
    pub gender: String,
    pub categories: BTreeSet<String>,
    pub social_category: String,
    pub income: String,
    pub sector: String,
    pub disability: String,
    pub support_needs: BTreeSet<String>,
}

impl FormDraft {
    /// Set a text field. `Category` replaces the selection with the single
    /// value; `SupportNeeds` is set-valued and ignored here.
    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::State => self.state = value,
            Field::Age => self.age = value,
            Field::Gender => self.gender = value,
            Field::Category => {
                self.categories.clear();
                if !value.trim().is_empty() {
                    self.categories.insert(value);
                }
            }
            Field::SocialCategory => self.social_category = value,
            Field::Income => self.income = value,
            Field::Sector => self.sector = value,
            Field::Disability => self.disability = value,
            Field::SupportNeeds => {}
        }
    }

    pub fn toggle_category(&mut self, category: String) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }

    pub fn toggle_support_need(&mut self, need: String) {
        if !self.support_needs.remove(&need) {
            self.support_needs.insert(need);
        }
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::State => self.state.clone(),
            Field::Age => self.age.clone(),
            Field::Gender => self.gender.clone(),
            Field::Category => join(&self.categories),
            Field::SocialCategory => self.social_category.clone(),
            Field::Income => self.income.clone(),
            Field::Sector => self.sector.clone(),
            Field::Disability => self.disability.clone(),
            Field::SupportNeeds => join(&self.support_needs),
        }
    }

    fn is_valid(&self, field: Field) -> bool {
        match field {
            Field::Category => self.categories.len() == 1,
            Field::SupportNeeds => true,
            other => !self.value(other).trim().is_empty(),
        }
    }

    /// Fields of `step` that block advancing, in display order.
    pub fn invalid_fields(&self, step: FormStep) -> Vec<Field> {
        step.fields()
            .iter()
            .copied()
            .filter(|&f| f.is_required() && !self.is_valid(f))
            .collect()
    }

    pub fn validate_step(&self, step: FormStep) -> Result<(), Vec<Field>> {
        let invalid = self.invalid_fields(step);
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(invalid)
        }
    }

    pub fn to_profile(&self) -> Result<FormProfile, Vec<Field>> {
        let invalid: Vec<Field> = [FormStep::Personal, FormStep::Background, FormStep::Needs]
            .into_iter()
            .flat_map(|step| self.invalid_fields(step))
            .collect();
        if !invalid.is_empty() {
            return Err(invalid);
        }

        Ok(FormProfile {
            state: self.state.trim().to_string(),
            age: self.age.trim().to_string(),
            gender: self.gender.trim().to_string(),
            category: self
                .categories
                .iter()
                .next()
                .map(|c| c.trim().to_string())
                .unwrap_or_default(),
            social_category: self.social_category.trim().to_string(),
            income: self.income.trim().to_string(),
            sector: self.sector.trim().to_string(),
            disability: self.disability.trim().to_string(),
            support_needs: self.support_needs.clone(),
        })
    }
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// A validated form submission. Built once, used to write the prompt, then
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormProfile {
    pub state: String,
    pub age: String,
    pub gender: String,
    pub category: String,
    pub social_category: String,
    pub income: String,
    pub sector: String,
    pub disability: String,
    pub support_needs: BTreeSet<String>,
}
