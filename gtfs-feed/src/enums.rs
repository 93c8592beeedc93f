use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// All the objects type from the GTFS specification that this library reads
#[derive(Debug, Serialize, Eq, PartialEq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// [Agency] <https://gtfs.org/reference/static/#agencytxt>
    Agency,
    /// [Stop] <https://gtfs.org/reference/static/#stopstxt>
    Stop,
    /// [Route] <https://gtfs.org/reference/static/#routestxt>
    Route,
    /// [Trip] <https://gtfs.org/reference/static/#tripstxt>
    Trip,
    /// [StopTime] <https://gtfs.org/reference/static/#stop_timestxt>
    StopTime,
    /// [Calendar] <https://gtfs.org/reference/static/#calendartxt>
    Calendar,
    /// [CalendarDate] <https://gtfs.org/reference/static/#calendar_datestxt>
    CalendarDate,
    /// [Shape] <https://gtfs.org/reference/static/#shapestxt>
    Shape,
    /// [FareAttribute] <https://gtfs.org/reference/static/#fare_attributestxt>
    Fare,
    /// [FareRule] <https://gtfs.org/reference/static/#fare_rulestxt>
    FareRule,
    /// [Frequency] <https://gtfs.org/reference/static/#frequenciestxt>
    Frequency,
    /// [Transfer] <https://gtfs.org/reference/static/#transferstxt>
    Transfer,
    /// [FeedInfo] <https://gtfs.org/reference/static/#feed_infotxt>
    FeedInfo,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ObjectType::Agency => "agency",
            ObjectType::Stop => "stop",
            ObjectType::Route => "route",
            ObjectType::Trip => "trip",
            ObjectType::StopTime => "stop time",
            ObjectType::Calendar => "calendar",
            ObjectType::CalendarDate => "calendar date",
            ObjectType::Shape => "shape",
            ObjectType::Fare => "fare attribute",
            ObjectType::FareRule => "fare rule",
            ObjectType::Frequency => "frequency",
            ObjectType::Transfer => "transfer",
            ObjectType::FeedInfo => "feed info",
        };
        write!(f, "{}", name)
    }
}

/// Integer coded GTFS enumerations
///
/// An empty CSV field always maps to the `Default` value of the enumeration.
trait GtfsCode: Sized + Default {
    /// Name used in error messages
    const NAME: &'static str;
    /// `None` if the code is not accepted at all
    fn from_code(code: i32) -> Option<Self>;
    fn code(&self) -> i32;
}

fn deserialize_code<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: GtfsCode,
{
    let s: String = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(T::default());
    }
    s.parse()
        .ok()
        .and_then(T::from_code)
        .ok_or_else(|| {
            serde::de::Error::custom(format!("invalid value for {}: {}", T::NAME, s))
        })
}

fn serialize_i32_as_str<S: Serializer>(s: S, value: i32) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

macro_rules! coded_serde {
    ($($t:ty),*) => {
        $(
            impl<'de> Deserialize<'de> for $t {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserialize_code(deserializer)
                }
            }

            impl Serialize for $t {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    serialize_i32_as_str(serializer, self.code())
                }
            }
        )*
    };
}

/// Replaces an `Unknown` value by the default value of the enumeration
pub(crate) trait ResetUnknown {
    fn reset_unknown(&mut self);
}

macro_rules! reset_unknown {
    ($($t:ident),*) => {
        $(
            impl ResetUnknown for $t {
                fn reset_unknown(&mut self) {
                    if let $t::Unknown(_) = self {
                        *self = $t::default();
                    }
                }
            }
        )*
    };
}

reset_unknown!(
    LocationType,
    PickupDropOffType,
    ContinuousPickupDropOff,
    Availability,
    BikesAllowedType
);

coded_serde!(
    LocationType,
    PickupDropOffType,
    ContinuousPickupDropOff,
    TimepointType,
    Availability,
    BikesAllowedType,
    ExactTimes
);

/// Describes the kind of [Stop]. See <https://gtfs.org/reference/static/#stopstxt> `location_type`
#[derive(Derivative, Debug, Copy, Clone, PartialEq, Eq)]
#[derivative(Default(bound = ""))]
pub enum LocationType {
    /// Stop (or Platform). A location where passengers board or disembark from a transit vehicle. Is called a platform when defined within a parent_station
    #[derivative(Default)]
    StopPoint,
    /// Station. A physical structure or area that contains one or more platform
    StopArea,
    /// A location where passengers can enter or exit a station from the street
    StationEntrance,
    /// A location within a station, not matching any other [Stop::location_type]
    GenericNode,
    /// A specific location on a platform, where passengers can board and/or alight vehicles
    BoardingArea,
    /// An unknown value
    Unknown(i32),
}

impl GtfsCode for LocationType {
    const NAME: &'static str = "LocationType";

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => LocationType::StopPoint,
            1 => LocationType::StopArea,
            2 => LocationType::StationEntrance,
            3 => LocationType::GenericNode,
            4 => LocationType::BoardingArea,
            i => LocationType::Unknown(i),
        })
    }

    fn code(&self) -> i32 {
        match self {
            LocationType::StopPoint => 0,
            LocationType::StopArea => 1,
            LocationType::StationEntrance => 2,
            LocationType::GenericNode => 3,
            LocationType::BoardingArea => 4,
            LocationType::Unknown(i) => *i,
        }
    }
}

/// Describes the kind of [Route]. See <https://gtfs.org/reference/static/#routestxt> `route_type`
///
/// Some route types are extended GTFS (<https://developers.google.com/transit/gtfs/reference/extended-route-types>)
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq, Hash)]
#[derivative(Default(bound = ""))]
pub enum RouteType {
    /// Tram, Streetcar, Light rail. Any light rail or street level system within a metropolitan area
    Tramway,
    /// Any underground rail system within a metropolitan area
    Subway,
    /// Used for intercity or long-distance travel
    Rail,
    /// Used for short- and long-distance bus routes
    #[derivative(Default)]
    Bus,
    /// Used for short- and long-distance boat service
    Ferry,
    /// Street-level rail cars where the cable runs beneath the vehicle
    CableCar,
    /// Aerial lift, suspended cable car
    Gondola,
    /// Any rail system designed for steep inclines
    Funicular,
    /// (extended) Used for intercity bus services
    Coach,
    /// (extended) Airplanes
    Air,
    /// (extended) Taxi, Cab
    Taxi,
    /// (extended) any other value
    Other(i32),
}

impl<'de> Deserialize<'de> for RouteType {
    fn deserialize<D>(deserializer: D) -> Result<RouteType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let i = i32::deserialize(deserializer)?;

        let hundreds = i / 100;
        Ok(match (i, hundreds) {
            (0, _) | (_, 9) => RouteType::Tramway,
            (1, _) | (_, 4) => RouteType::Subway,
            (2, _) | (_, 1) => RouteType::Rail,
            (3, _) | (_, 7) | (_, 8) => RouteType::Bus,
            (4, _) | (_, 10) | (_, 12) => RouteType::Ferry,
            (5, _) => RouteType::CableCar,
            (6, _) | (_, 13) => RouteType::Gondola,
            (7, _) | (_, 14) => RouteType::Funicular,
            (_, 2) => RouteType::Coach,
            (_, 11) => RouteType::Air,
            (_, 15) => RouteType::Taxi,
            _ => RouteType::Other(i),
        })
    }
}

impl Serialize for RouteType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // extended route types are written back as the first code of their family
        serializer.serialize_i32(match self {
            RouteType::Tramway => 0,
            RouteType::Subway => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableCar => 5,
            RouteType::Gondola => 6,
            RouteType::Funicular => 7,
            RouteType::Coach => 200,
            RouteType::Air => 1100,
            RouteType::Taxi => 1500,
            RouteType::Other(i) => *i,
        })
    }
}

/// Describes if and how a traveller can board or alight the vehicle. See <https://gtfs.org/reference/static/#stop_timestxt> `pickup_type` and `dropoff_type`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default(bound = ""))]
pub enum PickupDropOffType {
    /// Regularly scheduled pickup or drop off (default when empty).
    #[derivative(Default)]
    Regular,
    /// No pickup or drop off available.
    NotAvailable,
    /// Must phone agency to arrange pickup or drop off.
    ArrangeByPhone,
    /// Must coordinate with driver to arrange pickup or drop off.
    CoordinateWithDriver,
    /// An unknown value not in the specification
    Unknown(i32),
}

impl GtfsCode for PickupDropOffType {
    const NAME: &'static str = "PickupDropOffType";

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => PickupDropOffType::Regular,
            1 => PickupDropOffType::NotAvailable,
            2 => PickupDropOffType::ArrangeByPhone,
            3 => PickupDropOffType::CoordinateWithDriver,
            i => PickupDropOffType::Unknown(i),
        })
    }

    fn code(&self) -> i32 {
        match self {
            PickupDropOffType::Regular => 0,
            PickupDropOffType::NotAvailable => 1,
            PickupDropOffType::ArrangeByPhone => 2,
            PickupDropOffType::CoordinateWithDriver => 3,
            PickupDropOffType::Unknown(i) => *i,
        }
    }
}

/// Indicates whether a rider can board the transit vehicle anywhere along the vehicle’s travel path
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default(bound = ""))]
pub enum ContinuousPickupDropOff {
    /// Continuous stopping pickup or drop off.
    Continuous,
    /// No continuous stopping pickup or drop off (default when empty).
    #[derivative(Default)]
    NotAvailable,
    /// Must phone agency to arrange continuous stopping pickup or drop off.
    ArrangeByPhone,
    /// Must coordinate with driver to arrange continuous stopping pickup or drop off.
    CoordinateWithDriver,
    /// An unknown value not in the specification
    Unknown(i32),
}

impl GtfsCode for ContinuousPickupDropOff {
    const NAME: &'static str = "ContinuousPickupDropOff";

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => ContinuousPickupDropOff::Continuous,
            1 => ContinuousPickupDropOff::NotAvailable,
            2 => ContinuousPickupDropOff::ArrangeByPhone,
            3 => ContinuousPickupDropOff::CoordinateWithDriver,
            i => ContinuousPickupDropOff::Unknown(i),
        })
    }

    fn code(&self) -> i32 {
        match self {
            ContinuousPickupDropOff::Continuous => 0,
            ContinuousPickupDropOff::NotAvailable => 1,
            ContinuousPickupDropOff::ArrangeByPhone => 2,
            ContinuousPickupDropOff::CoordinateWithDriver => 3,
            ContinuousPickupDropOff::Unknown(i) => *i,
        }
    }
}

/// Describes if the stop time is exact or not. See <https://gtfs.org/reference/static/#stop_timestxt> `timepoint`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default)]
pub enum TimepointType {
    /// Times are considered approximate
    Approximate = 0,
    /// Times are considered exact
    #[derivative(Default)]
    Exact = 1,
}

impl GtfsCode for TimepointType {
    const NAME: &'static str = "timepoint";

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(TimepointType::Approximate),
            1 => Some(TimepointType::Exact),
            _ => None,
        }
    }

    fn code(&self) -> i32 {
        *self as i32
    }
}

/// Generic enum to define if a service (like wheelchair boarding) is available
#[derive(Debug, Derivative, PartialEq, Eq, Hash, Clone, Copy)]
#[derivative(Default)]
pub enum Availability {
    /// No information if the service is available
    #[derivative(Default)]
    InformationNotAvailable,
    /// The service is available
    Available,
    /// The service is not available
    NotAvailable,
    /// An unknown value not in the specification
    Unknown(i32),
}

impl GtfsCode for Availability {
    const NAME: &'static str = "Availability";

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Availability::InformationNotAvailable,
            1 => Availability::Available,
            2 => Availability::NotAvailable,
            i => Availability::Unknown(i),
        })
    }

    fn code(&self) -> i32 {
        match self {
            Availability::InformationNotAvailable => 0,
            Availability::Available => 1,
            Availability::NotAvailable => 2,
            Availability::Unknown(i) => *i,
        }
    }
}

/// Defines if a [CalendarDate] adds or removes a day from the service of a [Calendar]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Exception {
    /// There will be a service on that day
    #[serde(rename = "1")]
    Added,
    /// There won’t be a service on that day
    #[serde(rename = "2")]
    Removed,
}

/// Defines the direction of a [Trip], only for display, not for routing. See <https://gtfs.org/reference/static/#tripstxt> `direction_id`
#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum DirectionType {
    /// Travel in one direction (e.g. outbound travel).
    #[serde(rename = "0")]
    Outbound,
    /// Travel in the opposite direction (e.g. inbound travel).
    #[serde(rename = "1")]
    Inbound,
}

/// Is the [Trip] accessible with a bike. See <https://gtfs.org/reference/static/#tripstxt> `bikes_allowed`
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default())]
pub enum BikesAllowedType {
    /// No bike information for the trip
    #[derivative(Default)]
    NoBikeInfo,
    /// Vehicle being used on this particular trip can accommodate at least one bicycle
    AtLeastOneBike,
    /// No bicycles are allowed on this trip
    NoBikesAllowed,
    /// An unknown value not in the specification
    Unknown(i32),
}

impl GtfsCode for BikesAllowedType {
    const NAME: &'static str = "BikesAllowedType";

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => BikesAllowedType::NoBikeInfo,
            1 => BikesAllowedType::AtLeastOneBike,
            2 => BikesAllowedType::NoBikesAllowed,
            i => BikesAllowedType::Unknown(i),
        })
    }

    fn code(&self) -> i32 {
        match self {
            BikesAllowedType::NoBikeInfo => 0,
            BikesAllowedType::AtLeastOneBike => 1,
            BikesAllowedType::NoBikesAllowed => 2,
            BikesAllowedType::Unknown(i) => *i,
        }
    }
}

/// Defines where a [FareAttribute] can be paid
#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Fare is paid on board
    #[serde(rename = "0")]
    Aboard,
    /// Fare must be paid before boarding
    #[serde(rename = "1")]
    PreBoarding,
}

/// Defines if the [Frequency] is exact (the vehicle runs exactly every n minutes) or not
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default)]
pub enum ExactTimes {
    /// Frequency-based trips
    #[derivative(Default)]
    FrequencyBased = 0,
    /// Schedule-based trips with the exact same headway throughout the day.
    ScheduleBased = 1,
}

impl GtfsCode for ExactTimes {
    const NAME: &'static str = "exact_times";

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExactTimes::FrequencyBased),
            1 => Some(ExactTimes::ScheduleBased),
            _ => None,
        }
    }

    fn code(&self) -> i32 {
        *self as i32
    }
}

/// Defines how many transfers can be done with on [FareAttribute]
#[derive(Debug, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default(bound = ""))]
pub enum Transfers {
    /// Unlimited transfers are permitted
    #[derivative(Default)]
    Unlimited,
    /// No transfers permitted on this fare
    NoTransfer,
    /// Riders may transfer once
    UniqueTransfer,
    ///Riders may transfer twice
    TwoTransfers,
    /// Other transfer values
    Other(i32),
}

impl<'de> Deserialize<'de> for Transfers {
    fn deserialize<D>(deserializer: D) -> Result<Transfers, D::Error>
    where
        D: Deserializer<'de>,
    {
        let i = Option::<i32>::deserialize(deserializer)?;
        Ok(match i {
            Some(0) => Transfers::NoTransfer,
            Some(1) => Transfers::UniqueTransfer,
            Some(2) => Transfers::TwoTransfers,
            Some(a) => Transfers::Other(a),
            None => Transfers::default(),
        })
    }
}

impl Serialize for Transfers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Transfers::NoTransfer => serialize_i32_as_str(serializer, 0),
            Transfers::UniqueTransfer => serialize_i32_as_str(serializer, 1),
            Transfers::TwoTransfers => serialize_i32_as_str(serializer, 2),
            Transfers::Other(a) => serialize_i32_as_str(serializer, *a),
            Transfers::Unlimited => serializer.serialize_none(),
        }
    }
}

/// Defines the type of a [Transfer]
#[derive(Debug, Serialize, Deserialize, Derivative, Copy, Clone, PartialEq, Eq)]
#[derivative(Default)]
pub enum TransferType {
    /// Recommended transfer point between routes
    #[serde(rename = "0")]
    #[derivative(Default)]
    Recommended,
    /// Departing vehicle waits for arriving one
    #[serde(rename = "1")]
    Timed,
    /// Transfer requires a minimum amount of time between arrival and departure to ensure a connection.
    #[serde(rename = "2")]
    MinTime,
    /// Transfer is not possible at this location
    #[serde(rename = "3")]
    Impossible,
}
