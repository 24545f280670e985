use rust_decimal::Decimal;

use super::error::NfseError;
use super::types::*;
use super::validation;

/// Builder for a DPS.
///
/// ```
/// use nfse::core::*;
/// use rust_decimal_macros::dec;
///
/// let provider = ProviderBuilder::new(Identification::Cnpj("11222333000181".into()), "Prestadora Ltda")
///     .municipal_registration("12345")
///     .build();
/// let taker = PartyBuilder::new(Identification::Cpf("11144477735".into()), "Maria Silva").build();
/// let dps = DpsBuilder::new("1", "1", "3550308")
///     .competence("2025-06-01")
///     .provider(provider)
///     .taker(taker)
///     .service(ServiceLocation::Municipality("3550308".into()), ServiceCode {
///         national_code: "010101".into(),
///         municipal_code: None,
///         description: "Desenvolvimento de software".into(),
///         nbs_code: None,
///         internal_code: None,
///     })
///     .service_amount(dec!(1500.00))
///     .iss_rate(dec!(5))
///     .build()
///     .unwrap();
/// assert_eq!(dps.values.service.amount, dec!(1500.00));
/// ```
pub struct DpsBuilder {
    version: String,
    environment: Environment,
    issued_at: Option<String>,
    app_version: String,
    series: String,
    number: String,
    competence: Option<String>,
    emitter_role: EmitterRole,
    emission_municipality: String,
    substitution: Option<Substitution>,
    provider: Option<Provider>,
    taker: Option<Party>,
    intermediary: Option<Party>,
    service: Option<Service>,
    values: Values,
}

impl DpsBuilder {
    pub fn new(
        series: impl Into<String>,
        number: impl Into<String>,
        emission_municipality: impl Into<String>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            environment: Environment::Homologation,
            issued_at: None,
            app_version: concat!("nfse-", env!("CARGO_PKG_VERSION")).to_string(),
            series: series.into(),
            number: number.into(),
            competence: None,
            emitter_role: EmitterRole::Provider,
            emission_municipality: emission_municipality.into(),
            substitution: None,
            provider: None,
            taker: None,
            intermediary: None,
            service: None,
            values: Values {
                service: ServiceAmount::default(),
                discounts: None,
                deduction: None,
                taxation: Taxation {
                    municipal: MunicipalTax::default(),
                    federal: None,
                    totals: None,
                },
            },
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Emission timestamp (ISO-8601). Defaults to now.
    pub fn issued_at(mut self, timestamp: impl Into<String>) -> Self {
        self.issued_at = Some(timestamp.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Competence period (`YYYY-MM`, or a full date). Defaults to the emission month.
    pub fn competence(mut self, date: impl Into<String>) -> Self {
        self.competence = Some(date.into());
        self
    }

    pub fn emitter_role(mut self, role: EmitterRole) -> Self {
        self.emitter_role = role;
        self
    }

    pub fn substitution(mut self, substitution: Substitution) -> Self {
        self.substitution = Some(substitution);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn taker(mut self, taker: Party) -> Self {
        self.taker = Some(taker);
        self
    }

    pub fn intermediary(mut self, intermediary: Party) -> Self {
        self.intermediary = Some(intermediary);
        self
    }

    pub fn service(mut self, location: ServiceLocation, code: ServiceCode) -> Self {
        self.service = Some(Service {
            location,
            code,
            foreign_trade: None,
            leasing: None,
            construction: None,
            event: None,
            road: None,
            complementary: None,
        });
        self
    }

    /// Replace the whole service block, specialty blocks included.
    pub fn service_block(mut self, service: Service) -> Self {
        self.service = Some(service);
        self
    }

    pub fn service_amount(mut self, amount: Decimal) -> Self {
        self.values.service.amount = amount;
        self
    }

    pub fn discounts(mut self, unconditional: Option<Decimal>, conditional: Option<Decimal>) -> Self {
        self.values.discounts = Some(Discounts {
            unconditional,
            conditional,
        });
        self
    }

    pub fn deduction_percentage(mut self, percentage: Decimal) -> Self {
        self.values.deduction = Some(Deduction {
            percentage: Some(percentage),
            amount: None,
        });
        self
    }

    pub fn deduction_amount(mut self, amount: Decimal) -> Self {
        self.values.deduction = Some(Deduction {
            percentage: None,
            amount: Some(amount),
        });
        self
    }

    /// Taxable ISSQN at `rate` percent, not withheld.
    pub fn iss_rate(mut self, rate: Decimal) -> Self {
        let municipal = &mut self.values.taxation.municipal;
        municipal.situation = IssqnSituation::Taxable;
        municipal.rate = Some(rate);
        municipal.withholding.get_or_insert(IssWithholding::NotWithheld);
        self
    }

    pub fn municipal_tax(mut self, municipal: MunicipalTax) -> Self {
        self.values.taxation.municipal = municipal;
        self
    }

    pub fn federal_tax(mut self, federal: FederalTax) -> Self {
        self.values.taxation.federal = Some(federal);
        self
    }

    pub fn tax_totals(mut self, totals: TaxTotals) -> Self {
        self.values.taxation.totals = Some(totals);
        self
    }

    /// Build the DPS and validate its provider.
    pub fn build(self) -> Result<Dps, NfseError> {
        let dps = self.build_unchecked()?;
        let errors = validation::validate_provider(&dps.provider);
        if !errors.is_empty() {
            return Err(NfseError::Validation(errors));
        }
        Ok(dps)
    }

    /// Build without validation. Used when importing external data.
    pub fn build_unchecked(self) -> Result<Dps, NfseError> {
        let missing = |field: &str| {
            NfseError::Validation(vec![super::ValidationError::new(
                field,
                format!("{field} is required"),
            )])
        };
        let provider = self.provider.ok_or_else(|| missing("provider"))?;
        let taker = self.taker.ok_or_else(|| missing("taker"))?;
        let service = self.service.ok_or_else(|| missing("service"))?;

        let issued_at = self
            .issued_at
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        let competence = self
            .competence
            .unwrap_or_else(|| issued_at.chars().take(7).collect());

        Ok(Dps {
            version: self.version,
            environment: self.environment,
            issued_at,
            app_version: self.app_version,
            series: self.series,
            number: self.number,
            competence,
            emitter_role: self.emitter_role,
            emission_municipality: self.emission_municipality,
            substitution: self.substitution,
            provider,
            taker,
            intermediary: self.intermediary,
            service,
            values: self.values,
        })
    }
}

/// Builder for the provider (`prest`).
pub struct ProviderBuilder {
    identification: Identification,
    municipal_registration: Option<String>,
    name: String,
    address: Option<Address>,
    phone: Option<String>,
    email: Option<String>,
    regime: TaxRegime,
}

impl ProviderBuilder {
    pub fn new(identification: Identification, name: impl Into<String>) -> Self {
        Self {
            identification,
            municipal_registration: None,
            name: name.into(),
            address: None,
            phone: None,
            email: None,
            regime: TaxRegime::default(),
        }
    }

    pub fn municipal_registration(mut self, im: impl Into<String>) -> Self {
        self.municipal_registration = Some(im.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn regime(mut self, regime: TaxRegime) -> Self {
        self.regime = regime;
        self
    }

    pub fn build(self) -> Provider {
        Provider {
            identification: self.identification,
            municipal_registration: self.municipal_registration,
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            regime: self.regime,
        }
    }
}

/// Builder for a taker or intermediary.
pub struct PartyBuilder {
    identification: Identification,
    municipal_registration: Option<String>,
    name: String,
    address: Option<Address>,
    phone: Option<String>,
    email: Option<String>,
}

impl PartyBuilder {
    pub fn new(identification: Identification, name: impl Into<String>) -> Self {
        Self {
            identification,
            municipal_registration: None,
            name: name.into(),
            address: None,
            phone: None,
            email: None,
        }
    }

    pub fn municipal_registration(mut self, im: impl Into<String>) -> Self {
        self.municipal_registration = Some(im.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn build(self) -> Party {
        Party {
            identification: self.identification,
            municipal_registration: self.municipal_registration,
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Builder for Address.
pub struct AddressBuilder {
    location: AddressLocation,
    street: String,
    number: String,
    complement: Option<String>,
    district: String,
}

impl AddressBuilder {
    /// Brazilian address (`endNac`).
    pub fn national(
        municipality_code: impl Into<String>,
        postal_code: impl Into<String>,
        street: impl Into<String>,
        number: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self {
            location: AddressLocation::National {
                municipality_code: municipality_code.into(),
                postal_code: postal_code.into(),
            },
            street: street.into(),
            number: number.into(),
            complement: None,
            district: district.into(),
        }
    }

    /// Address abroad (`endExt`).
    pub fn foreign(
        country_code: impl Into<String>,
        city: impl Into<String>,
        street: impl Into<String>,
        number: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self {
            location: AddressLocation::Foreign {
                country_code: country_code.into(),
                postal_code: None,
                city: city.into(),
                state: None,
            },
            street: street.into(),
            number: number.into(),
            complement: None,
            district: district.into(),
        }
    }

    pub fn complement(mut self, complement: impl Into<String>) -> Self {
        self.complement = Some(complement.into());
        self
    }

    /// Postal code of a foreign address. Ignored for national ones.
    pub fn foreign_postal_code(mut self, code: impl Into<String>) -> Self {
        if let AddressLocation::Foreign { postal_code, .. } = &mut self.location {
            *postal_code = Some(code.into());
        }
        self
    }

    /// State/province of a foreign address. Ignored for national ones.
    pub fn foreign_state(mut self, value: impl Into<String>) -> Self {
        if let AddressLocation::Foreign { state, .. } = &mut self.location {
            *state = Some(value.into());
        }
        self
    }

    pub fn build(self) -> Address {
        Address {
            location: self.location,
            street: self.street,
            number: self.number,
            complement: self.complement,
            district: self.district,
        }
    }
}
