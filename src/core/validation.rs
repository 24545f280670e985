use super::document::{clean_digits, validate_cnpj, validate_cpf};
use super::error::ValidationError;
use super::types::*;

/// Validate the provider (`prest`). An empty result means the DPS may be emitted.
pub fn validate_provider(provider: &Provider) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if provider.name.trim().is_empty() {
        errors.push(ValidationError::new(
            "provider.name",
            "provider name must not be empty",
        ));
    }
    if let Identification::NoNif(_) = provider.identification {
        errors.push(ValidationError::new(
            "provider.identification",
            "provider must be identified by CNPJ, CPF, NIF or CAEPF",
        ));
    } else {
        validate_identification(&provider.identification, "provider.identification", &mut errors);
    }
    if let Some(address) = &provider.address {
        validate_address(address, "provider.address", &mut errors);
    }
    if let Some(email) = &provider.email {
        validate_email(email, "provider.email", &mut errors);
    }
    if let Some(code) = provider.regime.simples_apuration {
        if !(1..=3).contains(&code) {
            errors.push(ValidationError::new(
                "provider.regime.simples_apuration",
                format!("unknown Simples Nacional apuration regime {code}"),
            ));
        }
    }

    errors
}

/// Validate a taker or intermediary. `prefix` is the field path ("taker", "intermediary").
pub fn validate_party(party: &Party, prefix: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if party.name.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.name"),
            format!("{prefix} name must not be empty"),
        ));
    }
    validate_identification(
        &party.identification,
        &format!("{prefix}.identification"),
        &mut errors,
    );
    if let Some(address) = &party.address {
        validate_address(address, &format!("{prefix}.address"), &mut errors);
    }
    if let Some(email) = &party.email {
        validate_email(email, &format!("{prefix}.email"), &mut errors);
    }

    errors
}

/// Validate the NFSe emitter (`emit`). Only CNPJ or CPF may identify it.
pub fn validate_emitter(emitter: &Emitter) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if emitter.name.trim().is_empty() {
        errors.push(ValidationError::new(
            "emitter.name",
            "emitter name must not be empty",
        ));
    }
    match &emitter.identification {
        Identification::Cnpj(_) | Identification::Cpf(_) => {
            validate_identification(&emitter.identification, "emitter.identification", &mut errors)
        }
        other => errors.push(ValidationError::new(
            "emitter.identification",
            format!("emitter must be identified by CNPJ or CPF, got {}", other.tag()),
        )),
    }

    let address = &emitter.address;
    if address.street.trim().is_empty() {
        errors.push(ValidationError::new(
            "emitter.address.street",
            "street must not be empty",
        ));
    }
    validate_municipality(
        &address.municipality_code,
        "emitter.address.municipality_code",
        &mut errors,
    );
    if address.state.len() != 2 || !address.state.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(ValidationError::new(
            "emitter.address.state",
            format!("'{}' is not a two-letter UF", address.state),
        ));
    }
    validate_postal_code(
        &address.postal_code,
        "emitter.address.postal_code",
        &mut errors,
    );
    if let Some(email) = &emitter.email {
        validate_email(email, "emitter.email", &mut errors);
    }

    errors
}

/// Full domain validation of a DPS. Returns all errors found.
pub fn validate_dps(dps: &Dps) -> Vec<ValidationError> {
    let mut errors = validate_provider(&dps.provider);
    errors.extend(validate_party(&dps.taker, "taker"));
    if let Some(intermediary) = &dps.intermediary {
        errors.extend(validate_party(intermediary, "intermediary"));
    }

    validate_municipality(&dps.emission_municipality, "emission_municipality", &mut errors);
    if dps.series.is_empty() || dps.series.len() > 5 || clean_digits(&dps.series) != dps.series {
        errors.push(ValidationError::new(
            "series",
            "series must have 1 to 5 digits",
        ));
    }
    if dps.number.is_empty() || dps.number.len() > 15 || clean_digits(&dps.number) != dps.number {
        errors.push(ValidationError::new(
            "number",
            "DPS number must have 1 to 15 digits",
        ));
    }
    if dps.competence.trim().is_empty() {
        errors.push(ValidationError::new(
            "competence",
            "competence date must not be empty",
        ));
    }

    if let ServiceLocation::Municipality(code) = &dps.service.location {
        validate_municipality(code, "service.location", &mut errors);
    }
    let national = &dps.service.code.national_code;
    if national.len() != 6 || clean_digits(national) != *national {
        errors.push(ValidationError::new(
            "service.code.national_code",
            "national taxation code must have 6 digits",
        ));
    }
    if dps.service.code.description.trim().is_empty() {
        errors.push(ValidationError::new(
            "service.code.description",
            "service description must not be empty",
        ));
    }
    if let Some(event) = &dps.service.event {
        if event.end < event.start {
            errors.push(ValidationError::new(
                "service.event.end",
                "event cannot end before it starts",
            ));
        }
    }

    if dps.values.service.amount.is_sign_negative() {
        errors.push(ValidationError::new(
            "values.service.amount",
            "service amount must not be negative",
        ));
    }
    if let Some(deduction) = &dps.values.deduction {
        if deduction.percentage.is_some() && deduction.amount.is_some() {
            errors.push(ValidationError::new(
                "values.deduction",
                "deduction takes either a percentage or an amount, not both",
            ));
        }
    }

    let municipal = &dps.values.taxation.municipal;
    match municipal.situation {
        IssqnSituation::Export if municipal.result_country.is_none() => {
            errors.push(ValidationError::new(
                "values.taxation.municipal.result_country",
                "exports require the country where the result is verified",
            ));
        }
        IssqnSituation::Immune if municipal.immunity_type.is_none() => {
            errors.push(ValidationError::new(
                "values.taxation.municipal.immunity_type",
                "immunity requires the immunity type",
            ));
        }
        _ => {}
    }

    errors
}

fn validate_identification(id: &Identification, field: &str, errors: &mut Vec<ValidationError>) {
    match id {
        Identification::Cnpj(v) => {
            if !validate_cnpj(v) {
                errors.push(ValidationError::new(field, format!("invalid CNPJ '{v}'")));
            }
        }
        Identification::Cpf(v) => {
            if !validate_cpf(v) {
                errors.push(ValidationError::new(field, format!("invalid CPF '{v}'")));
            }
        }
        Identification::Nif(v) => {
            if v.trim().is_empty() || v.len() > 40 {
                errors.push(ValidationError::new(
                    field,
                    "NIF must have 1 to 40 characters",
                ));
            }
        }
        Identification::NoNif(code) => {
            if !matches!(code.as_str(), "0" | "1" | "2") {
                errors.push(ValidationError::new(
                    field,
                    format!("unknown cNaoNIF reason '{code}'"),
                ));
            }
        }
        Identification::Caepf(v) => {
            if clean_digits(v).len() != 14 {
                errors.push(ValidationError::new(field, "CAEPF must have 14 digits"));
            }
        }
    }
}

fn validate_address(address: &Address, prefix: &str, errors: &mut Vec<ValidationError>) {
    if address.street.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.street"),
            "street must not be empty",
        ));
    }
    if address.district.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.district"),
            "district must not be empty",
        ));
    }
    match &address.location {
        AddressLocation::National {
            municipality_code,
            postal_code,
        } => {
            validate_municipality(
                municipality_code,
                &format!("{prefix}.municipality_code"),
                errors,
            );
            validate_postal_code(postal_code, &format!("{prefix}.postal_code"), errors);
        }
        AddressLocation::Foreign {
            country_code, city, ..
        } => {
            if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_uppercase()) {
                errors.push(ValidationError::new(
                    format!("{prefix}.country_code"),
                    format!("'{country_code}' is not an ISO 3166-1 alpha-2 code"),
                ));
            }
            if city.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{prefix}.city"),
                    "city must not be empty",
                ));
            }
        }
    }
}

fn validate_municipality(code: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if code.len() != 7 || clean_digits(code) != code {
        errors.push(ValidationError::new(
            field,
            format!("'{code}' is not a 7-digit IBGE municipality code"),
        ));
    }
}

fn validate_postal_code(code: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if clean_digits(code).len() != 8 {
        errors.push(ValidationError::new(
            field,
            format!("'{code}' is not an 8-digit CEP"),
        ));
    }
}

fn validate_email(email: &str, field: &str, errors: &mut Vec<ValidationError>) {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        errors.push(ValidationError::new(
            field,
            format!("'{email}' is not an email address"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn national_address() -> Address {
        Address {
            location: AddressLocation::National {
                municipality_code: "3550308".into(),
                postal_code: "01310-100".into(),
            },
            street: "Avenida Paulista".into(),
            number: "1000".into(),
            complement: None,
            district: "Bela Vista".into(),
        }
    }

    fn provider(id: Identification) -> Provider {
        Provider {
            identification: id,
            municipal_registration: Some("12345".into()),
            name: "Prestadora Ltda".into(),
            address: Some(national_address()),
            phone: None,
            email: Some("fiscal@prestadora.com.br".into()),
            regime: TaxRegime::default(),
        }
    }

    #[test]
    fn valid_provider() {
        assert!(validate_provider(&provider(Identification::Cnpj("11222333000181".into()))).is_empty());
        assert!(validate_provider(&provider(Identification::Cpf("11144477735".into()))).is_empty());
    }

    #[test]
    fn provider_errors_are_collected() {
        let mut p = provider(Identification::Cnpj("11222333000180".into()));
        p.name = "  ".into();
        p.email = Some("nope".into());
        let errors = validate_provider(&p);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["provider.name", "provider.identification", "provider.email"]
        );
    }

    #[test]
    fn provider_cannot_use_no_nif() {
        let errors = validate_provider(&provider(Identification::NoNif("1".into())));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "provider.identification");
    }

    #[test]
    fn bad_municipality_code() {
        let mut p = provider(Identification::Cnpj("11222333000181".into()));
        p.address = Some(Address {
            location: AddressLocation::National {
                municipality_code: "355030".into(),
                postal_code: "01310100".into(),
            },
            ..national_address()
        });
        let errors = validate_provider(&p);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "provider.address.municipality_code");
    }

    #[test]
    fn foreign_party_address() {
        let party = Party {
            identification: Identification::Nif("PT123456789".into()),
            municipal_registration: None,
            name: "Cliente Lda".into(),
            address: Some(Address {
                location: AddressLocation::Foreign {
                    country_code: "pt".into(),
                    postal_code: Some("1000-001".into()),
                    city: "Lisboa".into(),
                    state: None,
                },
                street: "Rua Augusta".into(),
                number: "1".into(),
                complement: None,
                district: "Baixa".into(),
            }),
            phone: None,
            email: None,
        };
        let errors = validate_party(&party, "taker");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "taker.address.country_code");
    }

    #[test]
    fn emitter_rejects_nif() {
        let emitter = Emitter {
            identification: Identification::Nif("X1".into()),
            municipal_registration: None,
            name: "Emitente".into(),
            trade_name: None,
            address: EmitterAddress {
                street: "Rua A".into(),
                number: "1".into(),
                complement: None,
                district: "Centro".into(),
                municipality_code: "3550308".into(),
                state: "SP".into(),
                postal_code: "01001000".into(),
            },
            phone: None,
            email: None,
        };
        let errors = validate_emitter(&emitter);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("NIF"));
    }
}
