//! Caller-facing message templates.

use crate::verifier::PaymentErrorCode;
use serde::Deserialize;

/// Messages spoken to the caller. Every field can be overridden with
/// `PROMPTS__<FIELD>` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub no_transaction: String,
    pub welcome: String,
    pub success: String,
    pub invalid_pin: String,
    pub invalid_format: String,
    pub internal_error: String,
    pub verification_error: String,
    pub timeout: String,
    pub attempts_exhausted: String,

    /// Spoken before the code-specific payment message
    pub payment_error: String,
    pub premium_services_disabled: String,
    pub amount_limit_exceeded: String,
    pub payment_error_generic: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            no_transaction: "Dla numeru, z którego dzwonisz, nie ma aktywnej transakcji do płatności."
                .into(),
            welcome: "Witaj w pejtikon kropka kom. Rozpoczynasz zakupy kart podarunkowych w usłudze \
                      \"Płacę z Play\". Wpisz kod PIN z SMS-a i naciśnij krzyżyk."
                .into(),
            success: "Kod poprawny. Trwa finalizacja transakcji.".into(),
            invalid_pin: "Kod niepoprawny. Wpisz kod z SMS-a. W razie błędu zacznij od początku."
                .into(),
            invalid_format: "Kod PIN musi zawierać od 4 do 8 cyfr. Wpisz kod z SMS-a.".into(),
            internal_error: "Wystąpił błąd wewnętrzny. Spróbuj ponownie później.".into(),
            verification_error: "Wystąpił błąd podczas weryfikacji. Spróbuj ponownie później."
                .into(),
            timeout: "Czas na wprowadzenie kodu PIN wygasł. Dziękujemy za skorzystanie z usługi. \
                      Do widzenia."
                .into(),
            attempts_exhausted: "Przekroczono limit prób wprowadzenia kodu. Do widzenia.".into(),
            payment_error: "Kod poprawny, ale wystąpił błąd płatności.".into(),
            premium_services_disabled: "Usługa premium jest wyłączona.".into(),
            amount_limit_exceeded: "Przekroczono limit kwoty.".into(),
            payment_error_generic: "Spróbuj ponownie później.".into(),
        }
    }
}

impl Prompts {
    /// Full message for a refused payment.
    pub fn payment_message(&self, code: &PaymentErrorCode) -> String {
        let detail = match code {
            PaymentErrorCode::PremiumServicesDisabled => &self.premium_services_disabled,
            PaymentErrorCode::AmountLimitExceeded => &self.amount_limit_exceeded,
            PaymentErrorCode::Other(_) => &self.payment_error_generic,
        };
        format!("{} {}", self.payment_error, detail)
    }
}
